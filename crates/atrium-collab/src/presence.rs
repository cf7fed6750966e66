// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence tracker.
//!
//! Upserts the single presence row per user on join/leave/disconnect.
//! Deliberately last-writer-wins: no ordering is guaranteed between a
//! disconnect race and a rapid rejoin beyond "last call wins". Presence is
//! advisory and never consulted for authorization, so callers treat
//! failures as best-effort (log and continue).

use atrium_core::AtriumError;
use atrium_storage::queries::presence as presence_queries;
use atrium_storage::Database;

/// Mark a user online in the given room.
pub async fn mark_online(db: &Database, user_id: &str, room_id: &str) -> Result<(), AtriumError> {
    presence_queries::upsert_presence(db, user_id, Some(room_id), true).await
}

/// Mark a user offline and clear their current room.
pub async fn mark_offline(db: &Database, user_id: &str) -> Result<(), AtriumError> {
    presence_queries::upsert_presence(db, user_id, None, false).await
}
