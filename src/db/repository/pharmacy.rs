use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, format_ts, json_col, to_json, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const PHARMACY_COLUMNS: &str =
    "id, name, email, password_hash, image, license, phone, address, about, available, created_at";

fn pharmacy_from_row(row: &Row<'_>) -> rusqlite::Result<Pharmacy> {
    Ok(Pharmacy {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        image: row.get(4)?,
        license: row.get(5)?,
        phone: row.get(6)?,
        address: json_col(row, 7)?,
        about: row.get(8)?,
        available: row.get(9)?,
        created_at: row.get(10)?,
    })
}

pub fn insert_pharmacy(conn: &Connection, pharmacy: &Pharmacy) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO pharmacies ({PHARMACY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            pharmacy.id.to_string(),
            pharmacy.name,
            pharmacy.email,
            pharmacy.password_hash,
            pharmacy.image,
            pharmacy.license,
            pharmacy.phone,
            to_json(&pharmacy.address)?,
            pharmacy.about,
            pharmacy.available,
            pharmacy.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_pharmacy(conn: &Connection, id: &Uuid) -> Result<Option<Pharmacy>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {PHARMACY_COLUMNS} FROM pharmacies WHERE id = ?1"),
            params![id.to_string()],
            pharmacy_from_row,
        )
        .optional()?)
}

pub fn get_pharmacy_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Pharmacy>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {PHARMACY_COLUMNS} FROM pharmacies WHERE email = ?1"),
            params![email],
            pharmacy_from_row,
        )
        .optional()?)
}

pub fn list_pharmacies(conn: &Connection) -> Result<Vec<Pharmacy>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PHARMACY_COLUMNS} FROM pharmacies ORDER BY created_at, rowid"
    ))?;
    let rows = stmt
        .query_map([], pharmacy_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn toggle_pharmacy_availability(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    conn.query_row(
        "UPDATE pharmacies SET available = NOT available WHERE id = ?1 RETURNING available",
        params![id.to_string()],
        |row| row.get::<_, bool>(0),
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Pharmacy", id))
}

pub fn update_pharmacy_profile(
    conn: &Connection,
    id: &Uuid,
    name: &str,
    phone: &str,
    address: &Address,
    about: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE pharmacies SET name = ?2, phone = ?3, address = ?4, about = ?5 WHERE id = ?1",
        params![id.to_string(), name, phone, to_json(address)?, about],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Pharmacy", id));
    }
    Ok(())
}

/// Append one entry to a pharmacy's dispensing history. No deduplication.
pub fn insert_dispensing_record(
    conn: &Connection,
    pharmacy_id: &Uuid,
    record: &DispensingRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dispensing_history (pharmacy_id, prescription_id, status, dispensed_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            pharmacy_id.to_string(),
            record.prescription_id.to_string(),
            record.status.as_str(),
            format_ts(&record.dispensed_at),
        ],
    )?;
    Ok(())
}

pub fn list_dispensing_history(
    conn: &Connection,
    pharmacy_id: &Uuid,
) -> Result<Vec<DispensingRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT prescription_id, status, dispensed_at FROM dispensing_history
         WHERE pharmacy_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![pharmacy_id.to_string()], |row| {
            Ok(DispensingRecord {
                prescription_id: uuid_col(row, 0)?,
                status: enum_col(row, 1)?,
                dispensed_at: ts_col(row, 2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
