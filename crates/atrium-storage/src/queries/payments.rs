// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment mirror records, upserted from provider payment-intent webhooks.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};
use crate::models::Payment;

/// Fields synchronized from the provider's payment-intent object.
#[derive(Debug, Clone)]
pub struct PaymentSync {
    pub provider_payment_intent_id: String,
    pub amount: i64,
    pub amount_received: i64,
    pub currency: String,
    pub status: String,
    pub description: Option<String>,
    pub receipt_email: Option<String>,
    pub processed_at: Option<String>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}

/// Upsert a payment keyed by the provider payment-intent id.
pub async fn upsert_payment(
    db: &Database,
    user_id: &str,
    customer_id: &str,
    sync: PaymentSync,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let user_id = user_id.to_string();
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO payments
                   (id, user_id, customer_id, provider_payment_intent_id, amount,
                    amount_received, currency, status, description, receipt_email,
                    processed_at, failure_code, failure_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(provider_payment_intent_id) DO UPDATE SET
                   status = excluded.status,
                   amount_received = excluded.amount_received,
                   processed_at = excluded.processed_at,
                   failure_code = excluded.failure_code,
                   failure_message = excluded.failure_message",
                params![
                    id,
                    user_id,
                    customer_id,
                    sync.provider_payment_intent_id,
                    sync.amount,
                    sync.amount_received,
                    sync.currency,
                    sync.status,
                    sync.description,
                    sync.receipt_email,
                    sync.processed_at,
                    sync.failure_code,
                    sync.failure_message,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find a payment by provider payment-intent id.
pub async fn find_by_provider_id(
    db: &Database,
    provider_payment_intent_id: &str,
) -> Result<Option<Payment>, AtriumError> {
    let provider_payment_intent_id = provider_payment_intent_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, user_id, customer_id, provider_payment_intent_id, amount,
                        amount_received, currency, status, description, receipt_email,
                        processed_at, failure_code, failure_message
                 FROM payments WHERE provider_payment_intent_id = ?1",
                params![provider_payment_intent_id],
                |row| {
                    Ok(Payment {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        customer_id: row.get(2)?,
                        provider_payment_intent_id: row.get(3)?,
                        amount: row.get(4)?,
                        amount_received: row.get(5)?,
                        currency: row.get(6)?,
                        status: row.get(7)?,
                        description: row.get(8)?,
                        receipt_email: row.get(9)?,
                        processed_at: row.get(10)?,
                        failure_code: row.get(11)?,
                        failure_message: row.get(12)?,
                    })
                },
            );
            match result {
                Ok(payment) => Ok(Some(payment)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}
