// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment method mirror records.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};
use crate::models::PaymentMethod;

/// Upsert a payment method keyed by the provider payment-method id.
/// Re-attaching a previously detached method reactivates it.
pub async fn upsert_payment_method(
    db: &Database,
    customer_id: &str,
    provider_payment_method_id: &str,
    kind: &str,
    brand: Option<&str>,
    last4: Option<&str>,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let customer_id = customer_id.to_string();
    let provider_payment_method_id = provider_payment_method_id.to_string();
    let kind = kind.to_string();
    let brand = brand.map(|s| s.to_string());
    let last4 = last4.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO payment_methods
                   (id, customer_id, provider_payment_method_id, kind, brand, last4, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
                 ON CONFLICT(provider_payment_method_id) DO UPDATE SET
                   kind = excluded.kind,
                   brand = excluded.brand,
                   last4 = excluded.last4,
                   is_active = 1",
                params![id, customer_id, provider_payment_method_id, kind, brand, last4],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Deactivate a detached payment method. The row is kept for audit.
pub async fn detach_payment_method(
    db: &Database,
    provider_payment_method_id: &str,
) -> Result<(), AtriumError> {
    let provider_payment_method_id = provider_payment_method_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE payment_methods SET is_active = 0
                 WHERE provider_payment_method_id = ?1",
                params![provider_payment_method_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find a payment method by provider payment-method id.
pub async fn find_by_provider_id(
    db: &Database,
    provider_payment_method_id: &str,
) -> Result<Option<PaymentMethod>, AtriumError> {
    let provider_payment_method_id = provider_payment_method_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, customer_id, provider_payment_method_id, kind, brand, last4, is_active
                 FROM payment_methods WHERE provider_payment_method_id = ?1",
                params![provider_payment_method_id],
                |row| {
                    Ok(PaymentMethod {
                        id: row.get(0)?,
                        customer_id: row.get(1)?,
                        provider_payment_method_id: row.get(2)?,
                        kind: row.get(3)?,
                        brand: row.get(4)?,
                        last4: row.get(5)?,
                        is_active: row.get(6)?,
                    })
                },
            );
            match result {
                Ok(method) => Ok(Some(method)),
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

    #[tokio::test]
    async fn detach_flips_active_only() {
        let (db, customer_id, _dir) = setup_db().await;
        upsert_payment_method(&db, &customer_id, "pm_1", "card", Some("visa"), Some("4242"))
            .await
            .unwrap();

        detach_payment_method(&db, "pm_1").await.unwrap();

        let method = find_by_provider_id(&db, "pm_1").await.unwrap().unwrap();
        assert!(!method.is_active);
        assert_eq!(method.brand.as_deref(), Some("visa"));
        assert_eq!(method.last4.as_deref(), Some("4242"));
    }

    #[tokio::test]
    async fn reattach_reactivates() {
        let (db, customer_id, _dir) = setup_db().await;
        upsert_payment_method(&db, &customer_id, "pm_1", "card", Some("visa"), Some("4242"))
            .await
            .unwrap();
        detach_payment_method(&db, "pm_1").await.unwrap();
        upsert_payment_method(&db, &customer_id, "pm_1", "card", Some("visa"), Some("4242"))
            .await
            .unwrap();

        let method = find_by_provider_id(&db, "pm_1").await.unwrap().unwrap();
        assert!(method.is_active);
    }
}
