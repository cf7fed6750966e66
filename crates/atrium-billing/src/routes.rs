// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP endpoint.
//!
//! State machine per request: read raw body + signature header; verify the
//! signature (reject 400 before any record is written); record the event
//! keyed by the provider's unique id; dispatch by type; mark processed on
//! success. A duplicate delivery of an already-processed id is acknowledged
//! without re-applying. On a dispatch error the retry counter is bumped and
//! 500 is returned so the provider's own schedule redelivers.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{error, warn};

use atrium_storage::queries::webhook_events::{self, EventReceipt};
use atrium_storage::Database;

use crate::event::ProviderEvent;
use crate::reconciler::Reconciler;
use crate::signature::{self, SIGNATURE_HEADER};

/// Shared state for the webhook route.
#[derive(Clone)]
pub struct WebhookState {
    pub db: Database,
    pub secret: String,
    pub tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookState")
            .field("secret", &"[redacted]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

/// Build the axum router serving `POST /webhooks/payments`.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhooks/payments", post(handle_webhook))
        .with_state(state)
}

/// POST /webhooks/payments
pub async fn handle_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("webhook rejected: no signature header");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No signature" })),
        )
            .into_response();
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(e) = signature::verify(&state.secret, signature, &body, now, state.tolerance_secs) {
        warn!(error = %e, "webhook rejected: signature verification failed");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid signature" })),
        )
            .into_response();
    }

    let event: ProviderEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "webhook rejected: malformed event payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid payload" })),
            )
                .into_response();
        }
    };

    let payload = String::from_utf8_lossy(&body);
    let receipt =
        match webhook_events::record_event(&state.db, &event.id, &event.event_type, &payload).await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(error = %e, event = %event.id, "failed to record webhook event");
                return processing_failed();
            }
        };

    // Idempotency boundary: a duplicate of a processed event must never be
    // re-applied to local state.
    if receipt == EventReceipt::DuplicateProcessed {
        return (StatusCode::OK, Json(json!({ "received": true }))).into_response();
    }

    let reconciler = Reconciler::new(state.db.clone());
    match reconciler.process(&event).await {
        Ok(()) => {
            if let Err(e) = webhook_events::mark_processed(&state.db, &event.id).await {
                error!(error = %e, event = %event.id, "failed to mark webhook event processed");
                return processing_failed();
            }
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(e) => {
            error!(error = %e, event = %event.id, event_type = %event.event_type,
                   "webhook processing failed");
            if let Err(db_err) = webhook_events::record_failure(&state.db, &e.to_string()).await {
                error!(error = %db_err, "failed to record webhook failure state");
            }
            processing_failed()
        }
    }
}

fn processing_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Webhook processing failed" })),
    )
        .into_response()
}
