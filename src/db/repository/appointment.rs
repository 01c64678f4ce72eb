use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, json_col, opt_uuid_col, to_json, uuid_col};
use crate::db::DatabaseError;
use crate::models::enums::{PaymentMethod, PaymentStatus};
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, user_id, doc_id, slot_date, slot_time, user_data, doc_data,
     amount, booked_at, cancelled, is_completed, diagnosis_id, diagnosis_created,
     payment_status, payment_method";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        doc_id: uuid_col(row, 2)?,
        slot_date: row.get(3)?,
        slot_time: row.get(4)?,
        user_data: json_col(row, 5)?,
        doc_data: json_col(row, 6)?,
        amount: row.get(7)?,
        date: row.get(8)?,
        cancelled: row.get(9)?,
        is_completed: row.get(10)?,
        diagnosis_id: opt_uuid_col(row, 11)?,
        diagnosis_created: row.get(12)?,
        payment_status: enum_col(row, 13)?,
        payment_method: enum_col(row, 14)?,
    })
}

/// Record a booking. Called by the patient module; the slot ledger is updated separately.
pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            appt.id.to_string(),
            appt.user_id.to_string(),
            appt.doc_id.to_string(),
            appt.slot_date,
            appt.slot_time,
            to_json(&appt.user_data)?,
            to_json(&appt.doc_data)?,
            appt.amount,
            appt.date,
            appt.cancelled,
            appt.is_completed,
            appt.diagnosis_id.map(|id| id.to_string()),
            appt.diagnosis_created,
            appt.payment_status.as_str(),
            appt.payment_method.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            appointment_from_row,
        )
        .optional()?)
}

/// Write back the lifecycle flags after a transition.
pub fn save_appointment_state(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments
         SET cancelled = ?2, is_completed = ?3, diagnosis_id = ?4, diagnosis_created = ?5
         WHERE id = ?1",
        params![
            appt.id.to_string(),
            appt.cancelled,
            appt.is_completed,
            appt.diagnosis_id.map(|id| id.to_string()),
            appt.diagnosis_created,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Appointment", appt.id));
    }
    Ok(())
}

/// All appointments, newest booking first.
pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY booked_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map([], appointment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_appointments_for_doctor(
    conn: &Connection,
    doc_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE doc_id = ?1
         ORDER BY booked_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map(params![doc_id.to_string()], appointment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Whether the patient has ever booked with the doctor.
pub fn doctor_has_patient(
    conn: &Connection,
    doc_id: &Uuid,
    user_id: &Uuid,
) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM appointments WHERE doc_id = ?1 AND user_id = ?2)",
        params![doc_id.to_string(), user_id.to_string()],
        |row| row.get(0),
    )?)
}

pub fn count_appointments(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?)
}

/// Payment fields are written by the payment collaborator, never by the lifecycle.
pub fn update_payment(
    conn: &Connection,
    id: &Uuid,
    status: PaymentStatus,
    method: PaymentMethod,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET payment_status = ?2, payment_method = ?3 WHERE id = ?1",
        params![id.to_string(), status.as_str(), method.as_str()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures;

    #[test]
    fn insert_and_fetch_keeps_snapshots() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let user = fixtures::user(&conn, "ada@example.com");
        let appt = fixtures::booking(&conn, &doc, &user, "12_6_2025", "10:30 AM");

        let stored = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.user_data.email, "ada@example.com");
        assert_eq!(stored.doc_data.fees, 50);
        assert_eq!(stored.amount, 50);
        assert_eq!(stored.payment_method, PaymentMethod::Cash);
        assert!(stored.diagnosis_id.is_none());
    }

    #[test]
    fn database_rejects_cancelled_and_completed() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let user = fixtures::user(&conn, "ada@example.com");
        let mut appt = fixtures::booking(&conn, &doc, &user, "12_6_2025", "10:30 AM");
        appt.cancelled = true;
        appt.is_completed = true;
        assert!(save_appointment_state(&conn, &appt).is_err());
    }

    #[test]
    fn doctor_listing_is_scoped_and_newest_first() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let other = fixtures::doctor(&conn, "house@example.com");
        let user = fixtures::user(&conn, "ada@example.com");
        let first = fixtures::booking(&conn, &doc, &user, "12_6_2025", "10:30 AM");
        let second = fixtures::booking(&conn, &doc, &user, "12_6_2025", "11:00 AM");
        fixtures::booking(&conn, &other, &user, "12_6_2025", "10:30 AM");

        let listed = list_appointments_for_doctor(&conn, &doc.id).unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 2);
        // Same-millisecond bookings fall back to insertion order.
        if first.date == second.date {
            assert_eq!(ids, vec![second.id, first.id]);
        }
        assert_eq!(count_appointments(&conn).unwrap(), 3);
    }

    #[test]
    fn payment_update() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let user = fixtures::user(&conn, "ada@example.com");
        let appt = fixtures::booking(&conn, &doc, &user, "12_6_2025", "10:30 AM");
        update_payment(&conn, &appt.id, PaymentStatus::Completed, PaymentMethod::Online).unwrap();
        let stored = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Completed);
        let missing = Uuid::new_v4();
        let failed = update_payment(&conn, &missing, PaymentStatus::Failed, PaymentMethod::Cash);
        assert!(failed.is_err());
    }
}
