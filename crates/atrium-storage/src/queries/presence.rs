// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence upserts. One row per user, unconditionally overwritten
//! (last writer wins) -- presence is advisory, never authoritative.

use atrium_core::AtriumError;
use rusqlite::params;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::Presence;

/// Upsert the presence row for a user.
pub async fn upsert_presence(
    db: &Database,
    user_id: &str,
    room_id: Option<&str>,
    is_online: bool,
) -> Result<(), AtriumError> {
    let user_id = user_id.to_string();
    let room_id = room_id.map(|s| s.to_string());
    let last_seen = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO presence (user_id, is_online, room_id, last_seen)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                   is_online = excluded.is_online,
                   room_id = excluded.room_id,
                   last_seen = excluded.last_seen",
                params![user_id, is_online, room_id, last_seen],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the presence row for a user.
pub async fn get_presence(db: &Database, user_id: &str) -> Result<Option<Presence>, AtriumError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, is_online, room_id, last_seen FROM presence WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Presence {
                        user_id: row.get(0)?,
                        is_online: row.get(1)?,
                        room_id: row.get(2)?,
                        last_seen: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(presence) => Ok(Some(presence)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Mark every user offline. Run at startup: rows left online by a crashed
/// process would otherwise show phantom presence until the next join.
pub async fn reset_all_offline(db: &Database) -> Result<usize, AtriumError> {
    let last_seen = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE presence SET is_online = 0, room_id = NULL, last_seen = ?1
                 WHERE is_online = 1",
                params![last_seen],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;
    use atrium_config::model::StorageConfig;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        users::create_user(&db, "u1", "Ada", "ada@example.com").await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_creates_then_overwrites() {
        let (db, _dir) = setup_db().await;

        upsert_presence(&db, "u1", Some("room-1"), true).await.unwrap();
        let p = get_presence(&db, "u1").await.unwrap().unwrap();
        assert!(p.is_online);
        assert_eq!(p.room_id.as_deref(), Some("room-1"));

        upsert_presence(&db, "u1", None, false).await.unwrap();
        let p = get_presence(&db, "u1").await.unwrap().unwrap();
        assert!(!p.is_online);
        assert!(p.room_id.is_none());
    }

    #[tokio::test]
    async fn last_writer_wins_on_rapid_updates() {
        let (db, _dir) = setup_db().await;
        upsert_presence(&db, "u1", None, false).await.unwrap();
        upsert_presence(&db, "u1", Some("room-2"), true).await.unwrap();
        let p = get_presence(&db, "u1").await.unwrap().unwrap();
        assert!(p.is_online);
        assert_eq!(p.room_id.as_deref(), Some("room-2"));
    }

    #[tokio::test]
    async fn reset_all_offline_clears_stale_rows() {
        let (db, _dir) = setup_db().await;
        upsert_presence(&db, "u1", Some("room-1"), true).await.unwrap();

        let reset = reset_all_offline(&db).await.unwrap();
        assert_eq!(reset, 1);

        let p = get_presence(&db, "u1").await.unwrap().unwrap();
        assert!(!p.is_online);
        assert!(p.room_id.is_none());
    }
}
