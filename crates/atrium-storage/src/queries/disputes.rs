// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Charge dispute mirror records.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};
use crate::models::Dispute;

/// Fields synchronized from the provider's dispute object.
#[derive(Debug, Clone)]
pub struct DisputeSync {
    pub provider_dispute_id: String,
    pub amount: i64,
    pub currency: String,
    pub reason: String,
    pub status: String,
    pub is_charge_refundable: bool,
}

/// Upsert a dispute keyed by the provider dispute id.
pub async fn upsert_dispute(
    db: &Database,
    user_id: &str,
    sync: DisputeSync,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO disputes
                   (id, user_id, provider_dispute_id, amount, currency, reason, status,
                    is_charge_refundable)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(provider_dispute_id) DO UPDATE SET
                   reason = excluded.reason,
                   status = excluded.status,
                   is_charge_refundable = excluded.is_charge_refundable",
                params![
                    id,
                    user_id,
                    sync.provider_dispute_id,
                    sync.amount,
                    sync.currency,
                    sync.reason,
                    sync.status,
                    sync.is_charge_refundable,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find a dispute by provider dispute id.
pub async fn find_by_provider_id(
    db: &Database,
    provider_dispute_id: &str,
) -> Result<Option<Dispute>, AtriumError> {
    let provider_dispute_id = provider_dispute_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, user_id, provider_dispute_id, amount, currency, reason, status,
                        is_charge_refundable
                 FROM disputes WHERE provider_dispute_id = ?1",
                params![provider_dispute_id],
                |row| {
                    Ok(Dispute {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        provider_dispute_id: row.get(2)?,
                        amount: row.get(3)?,
                        currency: row.get(4)?,
                        reason: row.get(5)?,
                        status: row.get(6)?,
                        is_charge_refundable: row.get(7)?,
                    })
                },
            );
            match result {
                Ok(dispute) => Ok(Some(dispute)),
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
    use crate::queries::users;
    use atrium_config::model::StorageConfig;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        users::create_user(&db, "u1", "Ada", "ada@example.com").await.unwrap();
        (db, dir)
    }

    fn sync(reason: &str, status: &str) -> DisputeSync {
        DisputeSync {
            provider_dispute_id: "dp_1".to_string(),
            amount: 2500,
            currency: "usd".to_string(),
            reason: reason.to_string(),
            status: status.to_string(),
            is_charge_refundable: false,
        }
    }

    #[tokio::test]
    async fn dispute_round_trips() {
        let (db, _dir) = setup_db().await;
        upsert_dispute(&db, "u1", sync("fraudulent", "needs_response"))
            .await
            .unwrap();

        let dispute = find_by_provider_id(&db, "dp_1").await.unwrap().unwrap();
        assert_eq!(dispute.amount, 2500);
        assert_eq!(dispute.reason, "fraudulent");
        assert!(!dispute.is_charge_refundable);
    }

    #[tokio::test]
    async fn duplicate_delivery_updates_status_in_place() {
        let (db, _dir) = setup_db().await;
        upsert_dispute(&db, "u1", sync("general", "needs_response"))
            .await
            .unwrap();
        upsert_dispute(&db, "u1", sync("general", "under_review"))
            .await
            .unwrap();

        let dispute = find_by_provider_id(&db, "dp_1").await.unwrap().unwrap();
        assert_eq!(dispute.status, "under_review");
    }
}
