use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, json_col, to_json, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const NURSE_COLUMNS: &str = "id, name, email, password_hash, image, license_number, department,
     shift, specialization, experience, phone, address, available, assigned_doctors, created_at";

fn nurse_from_row(row: &Row<'_>) -> rusqlite::Result<Nurse> {
    Ok(Nurse {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        image: row.get(4)?,
        license_number: row.get(5)?,
        department: row.get(6)?,
        shift: enum_col(row, 7)?,
        specialization: row.get(8)?,
        experience: row.get(9)?,
        phone: row.get(10)?,
        address: json_col(row, 11)?,
        available: row.get(12)?,
        assigned_doctors: json_col(row, 13)?,
        created_at: row.get(14)?,
    })
}

pub fn insert_nurse(conn: &Connection, nurse: &Nurse) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO nurses ({NURSE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            nurse.id.to_string(),
            nurse.name,
            nurse.email,
            nurse.password_hash,
            nurse.image,
            nurse.license_number,
            nurse.department,
            nurse.shift.as_str(),
            nurse.specialization,
            nurse.experience,
            nurse.phone,
            to_json(&nurse.address)?,
            nurse.available,
            to_json(&nurse.assigned_doctors)?,
            nurse.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_nurse(conn: &Connection, id: &Uuid) -> Result<Option<Nurse>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {NURSE_COLUMNS} FROM nurses WHERE id = ?1"),
            params![id.to_string()],
            nurse_from_row,
        )
        .optional()?)
}

pub fn get_nurse_by_email(conn: &Connection, email: &str) -> Result<Option<Nurse>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {NURSE_COLUMNS} FROM nurses WHERE email = ?1"),
            params![email],
            nurse_from_row,
        )
        .optional()?)
}

pub fn list_nurses(conn: &Connection) -> Result<Vec<Nurse>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NURSE_COLUMNS} FROM nurses ORDER BY created_at, rowid"
    ))?;
    let rows = stmt
        .query_map([], nurse_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn toggle_nurse_availability(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    conn.query_row(
        "UPDATE nurses SET available = NOT available WHERE id = ?1 RETURNING available",
        params![id.to_string()],
        |row| row.get::<_, bool>(0),
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Nurse", id))
}

/// Persist the editable profile fields. Email, license and password stay as registered.
pub fn update_nurse_profile(conn: &Connection, nurse: &Nurse) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE nurses SET name = ?2, image = ?3, department = ?4, shift = ?5,
             specialization = ?6, experience = ?7, phone = ?8, address = ?9,
             assigned_doctors = ?10
         WHERE id = ?1",
        params![
            nurse.id.to_string(),
            nurse.name,
            nurse.image,
            nurse.department,
            nurse.shift.as_str(),
            nurse.specialization,
            nurse.experience,
            nurse.phone,
            to_json(&nurse.address)?,
            to_json(&nurse.assigned_doctors)?,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Nurse", nurse.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures;
    use crate::models::enums::Shift;

    #[test]
    fn profile_update_keeps_credentials() {
        let conn = open_memory_database().unwrap();
        let mut nurse = fixtures::nurse(&conn, "joy@example.com");
        let hash = nurse.password_hash.clone();
        nurse.shift = Shift::Night;
        nurse.department = "Oncology".into();
        nurse.password_hash = "ignored".into();
        update_nurse_profile(&conn, &nurse).unwrap();

        let stored = get_nurse_by_email(&conn, "joy@example.com").unwrap().unwrap();
        assert_eq!(stored.shift, Shift::Night);
        assert_eq!(stored.department, "Oncology");
        assert_eq!(stored.password_hash, hash);
    }

    #[test]
    fn update_missing_nurse_is_not_found() {
        let conn = open_memory_database().unwrap();
        let mut nurse = fixtures::nurse(&conn, "joy@example.com");
        nurse.id = Uuid::new_v4();
        assert!(matches!(
            update_nurse_profile(&conn, &nurse),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn availability_toggles_back_and_forth() {
        let conn = open_memory_database().unwrap();
        let nurse = fixtures::nurse(&conn, "joy@example.com");
        assert!(!toggle_nurse_availability(&conn, &nurse.id).unwrap());
        assert!(toggle_nurse_availability(&conn, &nurse.id).unwrap());
        assert_eq!(list_nurses(&conn).unwrap().len(), 1);
    }
}
