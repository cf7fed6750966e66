// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice mirror records, upserted from provider invoice webhooks.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};
use crate::models::Invoice;

/// Fields synchronized from the provider's invoice object.
#[derive(Debug, Clone)]
pub struct InvoiceSync {
    pub provider_invoice_id: String,
    pub number: String,
    pub status: String,
    pub currency: String,
    pub subtotal: i64,
    pub total: i64,
    pub amount_paid: i64,
    pub amount_due: i64,
    pub amount_remaining: i64,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub paid_at: Option<String>,
    pub hosted_invoice_url: Option<String>,
}

/// Upsert an invoice keyed by the provider invoice id.
pub async fn upsert_invoice(
    db: &Database,
    customer_id: &str,
    sync: InvoiceSync,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO invoices
                   (id, customer_id, provider_invoice_id, number, status, currency,
                    subtotal, total, amount_paid, amount_due, amount_remaining,
                    period_start, period_end, paid_at, hosted_invoice_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(provider_invoice_id) DO UPDATE SET
                   status = excluded.status,
                   total = excluded.total,
                   amount_paid = excluded.amount_paid,
                   amount_due = excluded.amount_due,
                   amount_remaining = excluded.amount_remaining,
                   paid_at = excluded.paid_at",
                params![
                    id,
                    customer_id,
                    sync.provider_invoice_id,
                    sync.number,
                    sync.status,
                    sync.currency,
                    sync.subtotal,
                    sync.total,
                    sync.amount_paid,
                    sync.amount_due,
                    sync.amount_remaining,
                    sync.period_start,
                    sync.period_end,
                    sync.paid_at,
                    sync.hosted_invoice_url,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find an invoice by provider invoice id.
pub async fn find_by_provider_id(
    db: &Database,
    provider_invoice_id: &str,
) -> Result<Option<Invoice>, AtriumError> {
    let provider_invoice_id = provider_invoice_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, customer_id, provider_invoice_id, number, status, currency,
                        subtotal, total, amount_paid, amount_due, amount_remaining,
                        period_start, period_end, paid_at, hosted_invoice_url
                 FROM invoices WHERE provider_invoice_id = ?1",
                params![provider_invoice_id],
                |row| {
                    Ok(Invoice {
                        id: row.get(0)?,
                        customer_id: row.get(1)?,
                        provider_invoice_id: row.get(2)?,
                        number: row.get(3)?,
                        status: row.get(4)?,
                        currency: row.get(5)?,
                        subtotal: row.get(6)?,
                        total: row.get(7)?,
                        amount_paid: row.get(8)?,
                        amount_due: row.get(9)?,
                        amount_remaining: row.get(10)?,
                        period_start: row.get(11)?,
                        period_end: row.get(12)?,
                        paid_at: row.get(13)?,
                        hosted_invoice_url: row.get(14)?,
                    })
                },
            );
            match result {
                Ok(invoice) => Ok(Some(invoice)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{customers, users};
    use atrium_config::model::StorageConfig;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        users::create_user(&db, "u1", "Ada", "ada@example.com").await.unwrap();
        customers::upsert_customer(&db, "u1", "cus_1", "ada@example.com", None)
            .await
            .unwrap();
        let customer_id = customers::find_by_provider_id(&db, "cus_1")
            .await
            .unwrap()
            .unwrap()
            .id;
        (db, customer_id, dir)
    }

    fn sync(status: &str, paid: i64) -> InvoiceSync {
        InvoiceSync {
            provider_invoice_id: "in_1".to_string(),
            number: "INV-0001".to_string(),
            status: status.to_string(),
            currency: "usd".to_string(),
            subtotal: 10000,
            total: 10000,
            amount_paid: paid,
            amount_due: 10000 - paid,
            amount_remaining: 10000 - paid,
            period_start: Some("2026-08-01T00:00:00.000Z".to_string()),
            period_end: Some("2026-09-01T00:00:00.000Z".to_string()),
            paid_at: None,
            hosted_invoice_url: None,
        }
    }

    #[tokio::test]
    async fn open_then_paid_updates_in_place() {
        let (db, customer_id, _dir) = setup_db().await;

        upsert_invoice(&db, &customer_id, sync("open", 0)).await.unwrap();
        let mut paid = sync("paid", 10000);
        paid.paid_at = Some("2026-08-06T09:00:00.000Z".to_string());
        upsert_invoice(&db, &customer_id, paid).await.unwrap();

        let invoice = find_by_provider_id(&db, "in_1").await.unwrap().unwrap();
        assert_eq!(invoice.status, "paid");
        assert_eq!(invoice.amount_paid, 10000);
        assert_eq!(invoice.amount_remaining, 0);
        assert!(invoice.paid_at.is_some());
    }
}
