// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room CRUD and join-authorization checks.
//!
//! The persisted participant list is the source of truth for room
//! membership; the in-memory registry in `atrium-collab` is only a cache of
//! live connections.

use atrium_core::AtriumError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::Room;

/// Create a room. The creator is implicitly authorized to join.
pub async fn create_room(
    db: &Database,
    id: &str,
    name: &str,
    created_by: &str,
) -> Result<(), AtriumError> {
    let id = id.to_string();
    let name = name.to_string();
    let created_by = created_by.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO rooms (id, name, created_by) VALUES (?1, ?2, ?3)",
                params![id, name, created_by],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a room by id.
pub async fn get_room(db: &Database, id: &str) -> Result<Option<Room>, AtriumError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, name, created_by, status, created_at FROM rooms WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Room {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_by: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            );
            match result {
                Ok(room) => Ok(Some(room)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Add a user to the room's persisted participant list. Idempotent.
pub async fn add_participant(
    db: &Database,
    room_id: &str,
    user_id: &str,
) -> Result<(), AtriumError> {
    let room_id = room_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO room_participants (room_id, user_id) VALUES (?1, ?2)
                 ON CONFLICT(room_id, user_id) DO NOTHING",
                params![room_id, user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Check whether a user may join a room: true iff the room exists and the
/// user is its creator or a listed participant.
pub async fn user_can_join(
    db: &Database,
    room_id: &str,
    user_id: &str,
) -> Result<bool, AtriumError> {
    let room_id = room_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM rooms r
                 LEFT JOIN room_participants p
                   ON p.room_id = r.id AND p.user_id = ?2
                 WHERE r.id = ?1 AND (r.created_by = ?2 OR p.user_id IS NOT NULL)",
                params![room_id, user_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Update the durable room status.
pub async fn update_room_status(
    db: &Database,
    room_id: &str,
    status: &str,
) -> Result<(), AtriumError> {
    let room_id = room_id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE rooms SET status = ?2 WHERE id = ?1",
                params![room_id, status],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
