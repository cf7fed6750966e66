// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document persistence with versioned saves.
//!
//! Every save runs in one transaction: read the live version, append an
//! immutable `document_versions` row at version+1, update the document.
//! The version counter never decreases and each successful save produces
//! exactly one version row; a failed save changes nothing.

use atrium_core::AtriumError;
use rusqlite::params;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::Document;

/// Create a document in a room, starting at version 0 with empty content.
pub async fn create_document(
    db: &Database,
    id: &str,
    room_id: &str,
    title: &str,
) -> Result<(), AtriumError> {
    let id = id.to_string();
    let room_id = room_id.to_string();
    let title = title.to_string();
    let updated_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO documents (id, room_id, title, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, room_id, title, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a document by id.
pub async fn get_document(db: &Database, id: &str) -> Result<Option<Document>, AtriumError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, room_id, title, content, version, updated_at
                 FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Document {
                        id: row.get(0)?,
                        room_id: row.get(1)?,
                        title: row.get(2)?,
                        content: row.get(3)?,
                        version: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(doc) => Ok(Some(doc)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Save document content atomically, returning the new version number.
///
/// Appends a `document_versions` row and bumps the live document in the same
/// transaction. Fails (without side effects) if the document does not exist.
pub async fn save_document(
    db: &Database,
    document_id: &str,
    content: &str,
    created_by: &str,
) -> Result<i64, AtriumError> {
    let document_id = document_id.to_string();
    let content = content.to_string();
    let created_by = created_by.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let version: i64 = tx.query_row(
                "SELECT version FROM documents WHERE id = ?1",
                params![document_id],
                |row| row.get(0),
            )?;
            let next = version + 1;

            tx.execute(
                "INSERT INTO document_versions (document_id, content, version, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![document_id, content, next, created_by, now],
            )?;
            tx.execute(
                "UPDATE documents SET content = ?2, version = ?3, updated_at = ?4 WHERE id = ?1",
                params![document_id, content, next, now],
            )?;

            tx.commit()?;
            Ok(next)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of version rows stored for a document.
pub async fn count_versions(db: &Database, document_id: &str) -> Result<i64, AtriumError> {
    let document_id = document_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM document_versions WHERE document_id = ?1",
                params![document_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}
