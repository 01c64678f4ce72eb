use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// One authenticated request as recorded in `audit_log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: String,
    pub role: String,
    pub principal: String,
    pub action: String,
    pub status: u16,
}

pub fn insert_audit_entry(
    conn: &Connection,
    role: &str,
    principal: &str,
    action: &str,
    status: u16,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (role, principal, action, status) VALUES (?1, ?2, ?3, ?4)",
        params![role, principal, action, status],
    )?;
    Ok(())
}

/// Prune audit entries older than the given number of days.
pub fn prune_audit_log(conn: &Connection, retention_days: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM audit_log WHERE timestamp < datetime('now', ?1)",
        params![format!("-{retention_days} days")],
    )?;
    Ok(deleted)
}

/// Entries for one principal within the last `days` days, newest first.
pub fn query_audit_by_principal(
    conn: &Connection,
    principal: &str,
    days: i64,
) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, role, principal, action, status FROM audit_log
         WHERE principal = ?1 AND timestamp >= datetime('now', ?2)
         ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map(params![principal, format!("-{days} days")], |row| {
            Ok(AuditEntry {
                timestamp: row.get(0)?,
                role: row.get(1)?,
                principal: row.get(2)?,
                action: row.get(3)?,
                status: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn entries_queryable_by_principal() {
        let conn = open_memory_database().unwrap();
        insert_audit_entry(&conn, "doctor", "d1", "GET /api/doctor/appointments", 200).unwrap();
        insert_audit_entry(&conn, "nurse", "n1", "GET /api/nurse/patients", 200).unwrap();
        insert_audit_entry(&conn, "doctor", "d1", "POST /api/doctor/cancel-appointment", 403)
            .unwrap();

        let entries = query_audit_by_principal(&conn, "d1", 1).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, 403);
        assert_eq!(entries[1].action, "GET /api/doctor/appointments");
    }

    #[test]
    fn prune_removes_old_rows() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO audit_log (timestamp, role, principal, action, status)
             VALUES (datetime('now', '-120 days'), 'admin', 'admin',
                     'GET /api/admin/dashboard', 200)",
            [],
        )
        .unwrap();
        insert_audit_entry(&conn, "admin", "admin", "GET /api/admin/dashboard", 200).unwrap();

        assert_eq!(prune_audit_log(&conn, 90).unwrap(), 1);
        assert_eq!(query_audit_by_principal(&conn, "admin", 365).unwrap().len(), 1);
    }
}
