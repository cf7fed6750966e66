// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook event audit/idempotency records.
//!
//! Receipt uses `INSERT ... ON CONFLICT DO NOTHING` so the UNIQUE constraint
//! on the provider event id is the idempotency boundary even under
//! concurrent duplicate deliveries: at-least-once delivery, at-most-once
//! effect.

use atrium_core::AtriumError;
use rusqlite::params;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::WebhookEventRecord;

/// Outcome of recording an inbound provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventReceipt {
    /// First sighting of this provider event id.
    New,
    /// Seen before but never successfully processed; safe to re-dispatch.
    DuplicateUnprocessed,
    /// Already applied; must not be dispatched again.
    DuplicateProcessed,
}

/// Record an inbound event, classifying duplicates by processed state.
pub async fn record_event(
    db: &Database,
    provider_event_id: &str,
    event_type: &str,
    payload: &str,
) -> Result<EventReceipt, AtriumError> {
    let provider_event_id = provider_event_id.to_string();
    let event_type = event_type.to_string();
    let payload = payload.to_string();
    let received_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO webhook_events (provider_event_id, event_type, payload, received_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(provider_event_id) DO NOTHING",
                params![provider_event_id, event_type, payload, received_at],
            )?;
            if inserted == 1 {
                return Ok(EventReceipt::New);
            }
            let processed: bool = conn.query_row(
                "SELECT processed FROM webhook_events WHERE provider_event_id = ?1",
                params![provider_event_id],
                |row| row.get(0),
            )?;
            Ok(if processed {
                EventReceipt::DuplicateProcessed
            } else {
                EventReceipt::DuplicateUnprocessed
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Mark an event successfully processed.
pub async fn mark_processed(db: &Database, provider_event_id: &str) -> Result<(), AtriumError> {
    let provider_event_id = provider_event_id.to_string();
    let processed_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE webhook_events SET processed = 1, processed_at = ?2
                 WHERE provider_event_id = ?1",
                params![provider_event_id, processed_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a processing failure: store the error message and bump the retry
/// counter on unprocessed events, capped at 3 attempts. The provider's own
/// redelivery schedule drives retries; no local backoff.
pub async fn record_failure(db: &Database, error: &str) -> Result<usize, AtriumError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE webhook_events
                 SET processing_error = ?1, retry_count = retry_count + 1
                 WHERE processed = 0 AND retry_count < 3",
                params![error],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch an event record by provider event id.
pub async fn get_event(
    db: &Database,
    provider_event_id: &str,
) -> Result<Option<WebhookEventRecord>, AtriumError> {
    let provider_event_id = provider_event_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, provider_event_id, event_type, payload, processed,
                        processed_at, processing_error, retry_count, received_at
                 FROM webhook_events WHERE provider_event_id = ?1",
                params![provider_event_id],
                |row| {
                    Ok(WebhookEventRecord {
                        id: row.get(0)?,
                        provider_event_id: row.get(1)?,
                        event_type: row.get(2)?,
                        payload: row.get(3)?,
                        processed: row.get(4)?,
                        processed_at: row.get(5)?,
                        processing_error: row.get(6)?,
                        retry_count: row.get(7)?,
                        received_at: row.get(8)?,
                    })
                },
            );
            match result {
                Ok(event) => Ok(Some(event)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of stored event rows (audit/testing helper).
pub async fn count_events(db: &Database) -> Result<i64, AtriumError> {
    db.connection()
        .call(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM webhook_events", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}
