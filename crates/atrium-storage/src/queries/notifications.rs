// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification persistence.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::Notification;

/// Create a notification for a user and return the stored row.
pub async fn create_notification(
    db: &Database,
    user_id: &str,
    title: &str,
    content: &str,
    kind: &str,
) -> Result<Notification, AtriumError> {
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        kind: kind.to_string(),
        is_read: false,
        created_at: now_rfc3339(),
    };
    let row = notification.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, title, content, kind, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.user_id,
                    row.title,
                    row.content,
                    row.kind,
                    row.is_read,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(notification)
}

/// List notifications for a user, newest first.
pub async fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<Notification>, AtriumError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, kind, is_read, created_at
                 FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(Notification {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    content: row.get(3)?,
                    kind: row.get(4)?,
                    is_read: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            let mut notifications = Vec::new();
            for row in rows {
                notifications.push(row?);
            }
            Ok(notifications)
        })
        .await
        .map_err(map_tr_err)
}
