// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whiteboard snapshot persistence, keyed by (room, creator).

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::Whiteboard;

/// Upsert the whiteboard snapshot for (room, creator) wholesale.
pub async fn upsert_whiteboard(
    db: &Database,
    room_id: &str,
    created_by: &str,
    data: &str,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let room_id = room_id.to_string();
    let created_by = created_by.to_string();
    let name = format!("Whiteboard {room_id}");
    let data = data.to_string();
    let updated_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO whiteboards (id, room_id, created_by, name, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(room_id, created_by) DO UPDATE SET
                   data = excluded.data,
                   updated_at = excluded.updated_at",
                params![id, room_id, created_by, name, data, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the whiteboard snapshot for (room, creator).
pub async fn get_whiteboard(
    db: &Database,
    room_id: &str,
    created_by: &str,
) -> Result<Option<Whiteboard>, AtriumError> {
    let room_id = room_id.to_string();
    let created_by = created_by.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, room_id, created_by, name, data, updated_at
                 FROM whiteboards WHERE room_id = ?1 AND created_by = ?2",
                params![room_id, created_by],
                |row| {
                    Ok(Whiteboard {
                        id: row.get(0)?,
                        room_id: row.get(1)?,
                        created_by: row.get(2)?,
                        name: row.get(3)?,
                        data: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(wb) => Ok(Some(wb)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently updated snapshot for a room, regardless of creator.
pub async fn latest_for_room(
    db: &Database,
    room_id: &str,
) -> Result<Option<Whiteboard>, AtriumError> {
    let room_id = room_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, room_id, created_by, name, data, updated_at
                 FROM whiteboards WHERE room_id = ?1
                 ORDER BY updated_at DESC LIMIT 1",
                params![room_id],
                |row| {
                    Ok(Whiteboard {
                        id: row.get(0)?,
                        room_id: row.get(1)?,
                        created_by: row.get(2)?,
                        name: row.get(3)?,
                        data: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(wb) => Ok(Some(wb)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}
