// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auth session operations and the storage-backed [`SessionVerifier`].

use async_trait::async_trait;
use rusqlite::params;

use atrium_core::{AtriumError, Identity, SessionVerifier};

use crate::database::{map_tr_err, now_rfc3339, Database};

/// Create an auth session binding a token to a user.
///
/// `expires_at` is an optional RFC 3339 timestamp; `None` means the session
/// does not expire.
pub async fn create_session(
    db: &Database,
    token: &str,
    user_id: &str,
    expires_at: Option<&str>,
) -> Result<(), AtriumError> {
    let token = token.to_string();
    let user_id = user_id.to_string();
    let expires_at = expires_at.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auth_sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an auth session (logout).
pub async fn delete_session(db: &Database, token: &str) -> Result<(), AtriumError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM auth_sessions WHERE token = ?1", params![token])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Resolve a token to the identity it belongs to.
///
/// Returns `None` for unknown or expired tokens.
pub async fn resolve_token(db: &Database, token: &str) -> Result<Option<Identity>, AtriumError> {
    let token = token.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT u.id, u.name FROM auth_sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1
                   AND (s.expires_at IS NULL OR s.expires_at > ?2)",
                params![token, now],
                |row| {
                    Ok(Identity {
                        user_id: row.get(0)?,
                        user_name: row.get(1)?,
                    })
                },
            );
            match result {
                Ok(identity) => Ok(Some(identity)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// [`SessionVerifier`] backed by the `auth_sessions` table.
#[derive(Clone)]
pub struct StoreSessionVerifier {
    db: Database,
}

impl StoreSessionVerifier {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionVerifier for StoreSessionVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AtriumError> {
        resolve_token(&self.db, token)
            .await?
            .ok_or_else(|| AtriumError::Auth("unknown or expired session token".to_string()))
    }
}
