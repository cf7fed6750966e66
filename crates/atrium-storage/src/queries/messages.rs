// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message persistence.
//!
//! Messages are append-only; only the reactions map may be updated later.
//! `create_message` returns the stored row with sender and reply-to
//! references resolved, in the shape broadcast to clients.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::{MessageSender, NewMessage, ReplyPreview, StoredMessage};

/// Persist a chat message and return it with sender/reply-to resolved.
pub async fn create_message(
    db: &Database,
    new: NewMessage,
) -> Result<StoredMessage, AtriumError> {
    let id = Uuid::new_v4().to_string();
    let created_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, room_id, sender_id, content, kind, reply_to_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    new.room_id,
                    new.sender_id,
                    new.content,
                    new.kind,
                    new.reply_to_id,
                    created_at,
                ],
            )?;

            let sender_name: String = conn.query_row(
                "SELECT name FROM users WHERE id = ?1",
                params![new.sender_id],
                |row| row.get(0),
            )?;

            let reply_to = match &new.reply_to_id {
                Some(reply_id) => {
                    let result = conn.query_row(
                        "SELECT m.id, m.content, u.id, u.name
                         FROM chat_messages m JOIN users u ON u.id = m.sender_id
                         WHERE m.id = ?1",
                        params![reply_id],
                        |row| {
                            Ok(ReplyPreview {
                                id: row.get(0)?,
                                content: row.get(1)?,
                                sender: MessageSender {
                                    id: row.get(2)?,
                                    name: row.get(3)?,
                                },
                            })
                        },
                    );
                    match result {
                        Ok(preview) => Some(preview),
                        Err(rusqlite::Error::QueryReturnedNoRows) => None,
                        Err(e) => return Err(e.into()),
                    }
                }
                None => None,
            };

            Ok(StoredMessage {
                id,
                room_id: new.room_id,
                content: new.content,
                kind: new.kind,
                sender: MessageSender {
                    id: new.sender_id,
                    name: sender_name,
                },
                reply_to,
                reactions: serde_json::Value::Object(serde_json::Map::new()),
                created_at,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Number of messages stored for a room.
pub async fn count_for_room(db: &Database, room_id: &str) -> Result<i64, AtriumError> {
    let room_id = room_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM chat_messages WHERE room_id = ?1",
                params![room_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Merge a reaction into a message's reactions map.
///
/// The reactions column is an opaque JSON object of emoji -> user id list;
/// this subsystem only appends the reacting user under the given key.
pub async fn add_reaction(
    db: &Database,
    message_id: &str,
    emoji: &str,
    user_id: &str,
) -> Result<(), AtriumError> {
    let message_id = message_id.to_string();
    let emoji = emoji.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let raw: String = conn.query_row(
                "SELECT reactions FROM chat_messages WHERE id = ?1",
                params![message_id],
                |row| row.get(0),
            )?;
            let mut reactions: serde_json::Value =
                serde_json::from_str(&raw).unwrap_or_else(|_| serde_json::json!({}));
            let entry = reactions
                .as_object_mut()
                .map(|obj| obj.entry(emoji.clone()).or_insert_with(|| serde_json::json!([])));
            if let Some(serde_json::Value::Array(users)) = entry {
                let already = users.iter().any(|v| v.as_str() == Some(user_id.as_str()));
                if !already {
                    users.push(serde_json::Value::String(user_id.clone()));
                }
            }
            conn.execute(
                "UPDATE chat_messages SET reactions = ?2 WHERE id = ?1",
                params![message_id, reactions.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
