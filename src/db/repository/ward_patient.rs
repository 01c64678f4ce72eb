use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, format_ts, json_col, opt_ts_col, opt_uuid_col, to_json, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::enums::WardStatus;
use crate::models::*;

const WARD_PATIENT_COLUMNS: &str = "id, name, age, gender, contact_number, emergency_contact,
     address, medical_history, allergies, blood_type, status, admission_date, discharge_date,
     bed_number, ward_number, assigned_doctor, assigned_nurse, chart, created_at, updated_at";

fn ward_patient_from_row(row: &Row<'_>) -> rusqlite::Result<WardPatient> {
    Ok(WardPatient {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: enum_col(row, 3)?,
        contact_number: row.get(4)?,
        emergency_contact: json_col(row, 5)?,
        address: json_col(row, 6)?,
        medical_history: row.get(7)?,
        allergies: json_col(row, 8)?,
        blood_type: enum_col(row, 9)?,
        status: enum_col(row, 10)?,
        admission_date: ts_col(row, 11)?,
        discharge_date: opt_ts_col(row, 12)?,
        bed_number: row.get(13)?,
        ward_number: row.get(14)?,
        assigned_doctor: opt_uuid_col(row, 15)?,
        assigned_nurse: opt_uuid_col(row, 16)?,
        chart: json_col(row, 17)?,
        created_at: ts_col(row, 18)?,
        updated_at: ts_col(row, 19)?,
    })
}

pub fn insert_ward_patient(conn: &Connection, patient: &WardPatient) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO ward_patients ({WARD_PATIENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20)"
        ),
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender.as_str(),
            patient.contact_number,
            to_json(&patient.emergency_contact)?,
            to_json(&patient.address)?,
            patient.medical_history,
            to_json(&patient.allergies)?,
            patient.blood_type.as_str(),
            patient.status.as_str(),
            format_ts(&patient.admission_date),
            patient.discharge_date.as_ref().map(format_ts),
            patient.bed_number,
            patient.ward_number,
            patient.assigned_doctor.map(|id| id.to_string()),
            patient.assigned_nurse.map(|id| id.to_string()),
            to_json(&patient.chart)?,
            format_ts(&patient.created_at),
            format_ts(&patient.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_ward_patient(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<WardPatient>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {WARD_PATIENT_COLUMNS} FROM ward_patients WHERE id = ?1"),
            params![id.to_string()],
            ward_patient_from_row,
        )
        .optional()?)
}

/// Patients assigned to a nurse, most recently updated first.
pub fn list_ward_patients_for_nurse(
    conn: &Connection,
    nurse_id: &Uuid,
    status: Option<WardStatus>,
) -> Result<Vec<WardPatient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WARD_PATIENT_COLUMNS} FROM ward_patients
         WHERE assigned_nurse = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY updated_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map(
            params![nurse_id.to_string(), status.map(|s| s.as_str())],
            ward_patient_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrite every mutable column. Callers bump `updated_at` before saving.
pub fn save_ward_patient(conn: &Connection, patient: &WardPatient) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE ward_patients SET name = ?2, age = ?3, gender = ?4, contact_number = ?5,
             emergency_contact = ?6, address = ?7, medical_history = ?8, allergies = ?9,
             blood_type = ?10, status = ?11, discharge_date = ?12, bed_number = ?13,
             ward_number = ?14, assigned_doctor = ?15, assigned_nurse = ?16, chart = ?17,
             updated_at = ?18
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender.as_str(),
            patient.contact_number,
            to_json(&patient.emergency_contact)?,
            to_json(&patient.address)?,
            patient.medical_history,
            to_json(&patient.allergies)?,
            patient.blood_type.as_str(),
            patient.status.as_str(),
            patient.discharge_date.as_ref().map(format_ts),
            patient.bed_number,
            patient.ward_number,
            patient.assigned_doctor.map(|id| id.to_string()),
            patient.assigned_nurse.map(|id| id.to_string()),
            to_json(&patient.chart)?,
            format_ts(&patient.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("WardPatient", patient.id));
    }
    Ok(())
}
