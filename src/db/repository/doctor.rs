use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{json_col, to_json, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str = "id, name, email, password_hash, image, speciality, degree, experience,
     about, fees, address, available, utc_offset_minutes, slots_booked, created_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        image: row.get(4)?,
        speciality: row.get(5)?,
        degree: row.get(6)?,
        experience: row.get(7)?,
        about: row.get(8)?,
        fees: row.get(9)?,
        address: json_col(row, 10)?,
        available: row.get(11)?,
        utc_offset_minutes: row.get(12)?,
        slots_booked: json_col(row, 13)?,
        created_at: row.get(14)?,
    })
}

pub fn insert_doctor(conn: &Connection, doc: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO doctors ({DOCTOR_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"),
        params![
            doc.id.to_string(),
            doc.name,
            doc.email,
            doc.password_hash,
            doc.image,
            doc.speciality,
            doc.degree,
            doc.experience,
            doc.about,
            doc.fees,
            to_json(&doc.address)?,
            doc.available,
            doc.utc_offset_minutes,
            to_json(&doc.slots_booked)?,
            doc.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let doc = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            params![id.to_string()],
            doctor_from_row,
        )
        .optional()?;
    Ok(doc)
}

pub fn get_doctor_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    let doc = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE email = ?1"),
            params![email],
            doctor_from_row,
        )
        .optional()?;
    Ok(doc)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY created_at, rowid"
    ))?;
    let doctors = stmt
        .query_map([], doctor_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(doctors)
}

pub fn count_doctors(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?)
}

/// Flip the doctor's availability flag, returning the new value.
pub fn toggle_doctor_availability(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let available = conn
        .query_row(
            "UPDATE doctors SET available = NOT available WHERE id = ?1 RETURNING available",
            params![id.to_string()],
            |row| row.get::<_, bool>(0),
        )
        .optional()?;
    available.ok_or_else(|| DatabaseError::not_found("Doctor", id))
}

pub fn update_doctor_profile(
    conn: &Connection,
    id: &Uuid,
    fees: i64,
    address: &Address,
    available: bool,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET fees = ?2, address = ?3, available = ?4 WHERE id = ?1",
        params![id.to_string(), fees, to_json(address)?, available],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Doctor", id));
    }
    Ok(())
}

pub fn get_slot_ledger(conn: &Connection, doctor_id: &Uuid) -> Result<SlotLedger, DatabaseError> {
    let ledger = conn
        .query_row(
            "SELECT slots_booked FROM doctors WHERE id = ?1",
            params![doctor_id.to_string()],
            |row| json_col(row, 0),
        )
        .optional()?;
    ledger.ok_or_else(|| DatabaseError::not_found("Doctor", doctor_id))
}

pub fn save_slot_ledger(
    conn: &Connection,
    doctor_id: &Uuid,
    ledger: &SlotLedger,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET slots_booked = ?2 WHERE id = ?1",
        params![doctor_id.to_string(), to_json(ledger)?],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Doctor", doctor_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures;

    #[test]
    fn insert_and_lookup_by_email() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");

        let found = get_doctor_by_email(&conn, "grey@example.com").unwrap().unwrap();
        assert_eq!(found.id, doc.id);
        assert_eq!(found.fees, 50);
        assert!(get_doctor_by_email(&conn, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let mut clone = doc.clone();
        clone.id = Uuid::new_v4();
        let err = insert_doctor(&conn, &clone).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn toggle_availability_flips() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        assert!(!toggle_doctor_availability(&conn, &doc.id).unwrap());
        assert!(toggle_doctor_availability(&conn, &doc.id).unwrap());
    }

    #[test]
    fn toggle_unknown_doctor_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = toggle_doctor_availability(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn slot_ledger_persists() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let mut ledger = get_slot_ledger(&conn, &doc.id).unwrap();
        assert!(ledger.is_empty());
        ledger.book("1_7_2025", "09:00 AM");
        save_slot_ledger(&conn, &doc.id, &ledger).unwrap();
        assert!(get_slot_ledger(&conn, &doc.id)
            .unwrap()
            .is_booked("1_7_2025", "09:00 AM"));
    }

    #[test]
    fn update_profile_changes_fees() {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let address = Address {
            line1: "1 Main St".into(),
            line2: String::new(),
        };
        update_doctor_profile(&conn, &doc.id, 80, &address, false).unwrap();
        let updated = get_doctor(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(updated.fees, 80);
        assert_eq!(updated.address, address);
        assert!(!updated.available);
    }
}
