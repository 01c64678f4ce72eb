use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, format_ts, json_col, opt_ts_col, to_json, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::enums::DispensingStatus;
use crate::models::*;

const DIAGNOSIS_COLUMNS: &str = "id, appointment_id, doc_id, user_id, diagnosis, prescription,
     medicines, tests, dispensing_status, follow_up_date, created_at, dispensed_date,
     last_refill_date, refills_remaining, history_notes";

fn diagnosis_from_row(row: &Row<'_>) -> rusqlite::Result<Diagnosis> {
    let follow_up_date = row
        .get::<_, Option<String>>(9)?
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    9,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;
    Ok(Diagnosis {
        id: uuid_col(row, 0)?,
        appointment_id: uuid_col(row, 1)?,
        doc_id: uuid_col(row, 2)?,
        user_id: uuid_col(row, 3)?,
        diagnosis: row.get(4)?,
        prescription: row.get(5)?,
        medicines: json_col(row, 6)?,
        tests: json_col(row, 7)?,
        dispensing_status: enum_col(row, 8)?,
        follow_up_date,
        date: ts_col(row, 10)?,
        medicine_history: MedicineHistory {
            dispensed_date: opt_ts_col(row, 11)?,
            last_refill_date: opt_ts_col(row, 12)?,
            refills_remaining: row.get(13)?,
            notes: row.get(14)?,
        },
    })
}

pub fn insert_diagnosis(conn: &Connection, diag: &Diagnosis) -> Result<(), DatabaseError> {
    let history = &diag.medicine_history;
    conn.execute(
        &format!(
            "INSERT INTO diagnoses ({DIAGNOSIS_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            diag.id.to_string(),
            diag.appointment_id.to_string(),
            diag.doc_id.to_string(),
            diag.user_id.to_string(),
            diag.diagnosis,
            diag.prescription,
            to_json(&diag.medicines)?,
            to_json(&diag.tests)?,
            diag.dispensing_status.as_str(),
            diag.follow_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
            format_ts(&diag.date),
            history.dispensed_date.as_ref().map(format_ts),
            history.last_refill_date.as_ref().map(format_ts),
            history.refills_remaining,
            history.notes,
        ],
    )?;
    Ok(())
}

pub fn get_diagnosis(conn: &Connection, id: &Uuid) -> Result<Option<Diagnosis>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = ?1"),
            params![id.to_string()],
            diagnosis_from_row,
        )
        .optional()?)
}

pub fn get_diagnosis_by_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Option<Diagnosis>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE appointment_id = ?1"),
            params![appointment_id.to_string()],
            diagnosis_from_row,
        )
        .optional()?)
}

/// A patient's diagnoses, newest first.
pub fn list_diagnoses_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map(params![user_id.to_string()], diagnosis_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every diagnosis, newest first. `open_only` drops the fully dispensed ones.
pub fn list_diagnoses(conn: &Connection, open_only: bool) -> Result<Vec<Diagnosis>, DatabaseError> {
    let filter = if open_only {
        "WHERE dispensing_status != 'completed'"
    } else {
        ""
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses {filter} ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map([], diagnosis_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_diagnoses_by_status(
    conn: &Connection,
    status: DispensingStatus,
) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM diagnoses WHERE dispensing_status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?)
}

/// Set the dispensing status. The first transition to completed stamps `dispensed_date`.
pub fn set_dispensing_status(
    conn: &Connection,
    id: &Uuid,
    status: DispensingStatus,
    at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE diagnoses SET dispensing_status = ?2,
             dispensed_date = CASE WHEN ?2 = 'completed' THEN COALESCE(dispensed_date, ?3)
                                   ELSE dispensed_date END
         WHERE id = ?1",
        params![id.to_string(), status.as_str(), format_ts(at)],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Diagnosis", id));
    }
    Ok(())
}
