// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session verification seam for the connection gateway.

use async_trait::async_trait;

use crate::error::AtriumError;
use crate::types::Identity;

/// Resolves a handshake token to a verified identity.
///
/// The gateway calls this exactly once per incoming connection, before the
/// WebSocket upgrade completes. No event is ever dispatched on behalf of an
/// unverified token.
#[async_trait]
pub trait SessionVerifier: Send + Sync + 'static {
    /// Verify the given token, returning the identity it belongs to.
    ///
    /// Returns [`AtriumError::Auth`] for missing, unknown, or expired tokens.
    async fn verify(&self, token: &str) -> Result<Identity, AtriumError>;
}
