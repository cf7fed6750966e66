// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time collaboration server for consultation rooms.
//!
//! A [`CollabServer`] is constructed once at process start and owns the
//! in-memory room registry and the handles to its collaborators (storage,
//! session verification). The axum `/ws` route authenticates each handshake
//! before upgrade; per-connection tasks then feed inbound frames through
//! the event router, which validates room membership, mutates ephemeral
//! registry state, persists durable state, and broadcasts to the rest of
//! the room.

pub mod gateway;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod router;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use atrium_config::model::CollabConfig;
use atrium_core::{Identity, SessionVerifier};
use atrium_storage::Database;

use crate::registry::{ConnHandle, Registry};

/// Per-connection mutable context, owned by the connection's receive loop.
///
/// `room_id` mirrors the transport-level room membership: events targeting
/// any other room are rejected without side effects.
#[derive(Debug)]
pub struct ConnCtx {
    pub conn_id: String,
    pub user_id: String,
    pub user_name: String,
    pub room_id: Option<String>,
}

/// The collaboration server. One instance per process.
pub struct CollabServer {
    registry: Registry,
    db: Database,
    verifier: Arc<dyn SessionVerifier>,
    config: CollabConfig,
    start_time: Instant,
}

impl CollabServer {
    /// Create the server with its collaborators injected.
    pub fn new(
        db: Database,
        verifier: Arc<dyn SessionVerifier>,
        config: CollabConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: Registry::new(),
            db,
            verifier,
            config,
            start_time: Instant::now(),
        })
    }

    /// Build the axum router serving `/ws` and `/health`.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/ws", get(gateway::ws_handler))
            .route("/health", get(gateway::get_health))
            .with_state(Arc::clone(self))
            .layer(CorsLayer::permissive())
    }

    /// Register a live connection's outbound handle.
    pub fn register_conn(&self, conn_id: &str, identity: &Identity, sender: mpsc::Sender<String>) {
        self.registry.add_conn(
            conn_id,
            ConnHandle {
                user_id: identity.user_id.clone(),
                user_name: identity.user_name.clone(),
                sender,
            },
        );
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub(crate) fn verifier(&self) -> &Arc<dyn SessionVerifier> {
        &self.verifier
    }

    pub(crate) fn config(&self) -> &CollabConfig {
        &self.config
    }

    pub(crate) fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
