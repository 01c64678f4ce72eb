use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{enum_col, format_ts, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::Notification;

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        message: row.get(2)?,
        kind: enum_col(row, 3)?,
        is_read: row.get(4)?,
        created_at: ts_col(row, 5)?,
    })
}

pub fn insert_notification(conn: &Connection, note: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, message, kind, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            note.id.to_string(),
            note.user_id.to_string(),
            note.message,
            note.kind.as_str(),
            note.is_read,
            format_ts(&note.created_at),
        ],
    )?;
    Ok(())
}

/// A patient's inbox, newest first.
pub fn list_notifications_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, kind, is_read, created_at FROM notifications
         WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![user_id.to_string()], notification_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Mark one of the user's own notifications read. Someone else's id reads as not found.
pub fn mark_notification_read(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Notification", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures;
    use crate::models::enums::NotificationType;

    #[test]
    fn inbox_is_per_user() {
        let conn = open_memory_database().unwrap();
        let ada = fixtures::user(&conn, "ada@example.com");
        let bob = fixtures::user(&conn, "bob@example.com");
        let note = Notification::new(ada.id, "Diagnosis ready", NotificationType::Diagnosis);
        insert_notification(&conn, &note).unwrap();

        assert_eq!(list_notifications_for_user(&conn, &ada.id).unwrap().len(), 1);
        assert!(list_notifications_for_user(&conn, &bob.id).unwrap().is_empty());
    }

    #[test]
    fn mark_read_only_own() {
        let conn = open_memory_database().unwrap();
        let ada = fixtures::user(&conn, "ada@example.com");
        let bob = fixtures::user(&conn, "bob@example.com");
        let note = Notification::new(ada.id, "hello", NotificationType::General);
        insert_notification(&conn, &note).unwrap();

        assert!(mark_notification_read(&conn, &bob.id, &note.id).is_err());
        mark_notification_read(&conn, &ada.id, &note.id).unwrap();
        let inbox = list_notifications_for_user(&conn, &ada.id).unwrap();
        assert!(inbox[0].is_read);
        assert_eq!(inbox[0].kind, NotificationType::General);
    }
}
