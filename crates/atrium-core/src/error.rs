// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Atrium portal backend.

use thiserror::Error;

/// The primary error type used across Atrium crates.
#[derive(Debug, Error)]
pub enum AtriumError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connect-time authentication failure (missing, unknown, or expired token).
    /// The connection is refused before any event handler runs.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Join authorization failure: the user is neither the room's creator
    /// nor a listed participant. The connection stays alive.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// An event targeted a room the connection has not joined.
    #[error("not in room: {0}")]
    NotInRoom(String),

    /// Transport/channel errors (bind failure, socket send failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Webhook signature verification failure. The request is rejected
    /// before any record is written.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// Webhook payload or dispatch errors.
    #[error("webhook error: {message}")]
    Webhook {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
