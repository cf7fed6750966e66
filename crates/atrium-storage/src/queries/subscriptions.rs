// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription mirror records, upserted from provider webhooks.
//!
//! The status column is always a translation of the provider's status
//! string; it is never advanced by local logic.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};
use crate::models::Subscription;

/// Fields synchronized from the provider's subscription object.
#[derive(Debug, Clone)]
pub struct SubscriptionSync {
    pub provider_subscription_id: String,
    pub status: String,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub trial_start: Option<String>,
    pub trial_end: Option<String>,
    pub canceled_at: Option<String>,
    pub cancel_at_period_end: bool,
}

/// Upsert a subscription keyed by the provider subscription id.
pub async fn upsert_subscription(
    db: &Database,
    user_id: &str,
    customer_id: &str,
    sync: SubscriptionSync,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let user_id = user_id.to_string();
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscriptions
                   (id, user_id, customer_id, provider_subscription_id, status,
                    current_period_start, current_period_end, trial_start, trial_end,
                    canceled_at, cancel_at_period_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(provider_subscription_id) DO UPDATE SET
                   status = excluded.status,
                   current_period_start = excluded.current_period_start,
                   current_period_end = excluded.current_period_end,
                   trial_start = excluded.trial_start,
                   trial_end = excluded.trial_end,
                   canceled_at = excluded.canceled_at,
                   cancel_at_period_end = excluded.cancel_at_period_end",
                params![
                    id,
                    user_id,
                    customer_id,
                    sync.provider_subscription_id,
                    sync.status,
                    sync.current_period_start,
                    sync.current_period_end,
                    sync.trial_start,
                    sync.trial_end,
                    sync.canceled_at,
                    sync.cancel_at_period_end,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a subscription canceled (terminal provider state).
pub async fn cancel_subscription(
    db: &Database,
    provider_subscription_id: &str,
    status: &str,
    canceled_at: Option<&str>,
) -> Result<(), AtriumError> {
    let provider_subscription_id = provider_subscription_id.to_string();
    let status = status.to_string();
    let canceled_at = canceled_at.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE subscriptions SET status = ?2, canceled_at = ?3
                 WHERE provider_subscription_id = ?1",
                params![provider_subscription_id, status, canceled_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find a subscription by provider subscription id.
pub async fn find_by_provider_id(
    db: &Database,
    provider_subscription_id: &str,
) -> Result<Option<Subscription>, AtriumError> {
    let provider_subscription_id = provider_subscription_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, user_id, customer_id, provider_subscription_id, status,
                        current_period_start, current_period_end, trial_start, trial_end,
                        canceled_at, cancel_at_period_end
                 FROM subscriptions WHERE provider_subscription_id = ?1",
                params![provider_subscription_id],
                |row| {
                    Ok(Subscription {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        customer_id: row.get(2)?,
                        provider_subscription_id: row.get(3)?,
                        status: row.get(4)?,
                        current_period_start: row.get(5)?,
                        current_period_end: row.get(6)?,
                        trial_start: row.get(7)?,
                        trial_end: row.get(8)?,
                        canceled_at: row.get(9)?,
                        cancel_at_period_end: row.get(10)?,
                    })
                },
            );
            match result {
                Ok(sub) => Ok(Some(sub)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}
