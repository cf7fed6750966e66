// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection gateway: WebSocket upgrade with handshake authentication.
//!
//! The session token travels as a query parameter (`GET /ws?token=...`).
//! Resolution happens before the upgrade completes; a missing or invalid
//! token yields HTTP 401 and no socket is ever created, so no event handler
//! runs for an unauthenticated connection.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use atrium_core::Identity;

use crate::{CollabServer, ConnCtx};

/// Handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
///
/// Unauthenticated liveness endpoint.
pub async fn get_health(State(server): State<Arc<CollabServer>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: server.uptime_secs(),
    })
}

/// WebSocket upgrade handler.
///
/// Authenticates the handshake token, then spawns the connection task.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(server): State<Arc<CollabServer>>,
) -> Response {
    let token = match query.token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => {
            return (StatusCode::UNAUTHORIZED, "authentication token required").into_response();
        }
    };

    let identity = match server.verifier().verify(token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, "handshake authentication failed");
            return (StatusCode::UNAUTHORIZED, "invalid authentication").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, server, identity))
}

/// Handle an individual authenticated WebSocket connection.
///
/// Spawns a sender task forwarding outbound frames, then reads inbound
/// frames in order and feeds them through the event router. Disconnect
/// triggers the synchronous cleanup path (room leave + presence offline);
/// in-flight persistence operations complete or fail independently.
async fn handle_socket(socket: WebSocket, server: Arc<CollabServer>, identity: Identity) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let conn_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<String>(server.config().outbound_buffer);
    server.register_conn(&conn_id, &identity, tx);

    let mut ctx = ConnCtx {
        conn_id,
        user_id: identity.user_id,
        user_name: identity.user_name,
        room_id: None,
    };
    tracing::debug!(user = %ctx.user_id, conn = %ctx.conn_id, "connection established");

    // Forward outbound frames to the socket.
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Per-connection inbound ordering follows the stream.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                server.handle_event(&mut ctx, text_str).await;
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping/pong (handled by the transport layer).
        }
    }

    server.handle_disconnect(&mut ctx).await;
    sender_task.abort();
    tracing::debug!(user = %ctx.user_id, conn = %ctx.conn_id, "connection closed");
}
