// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer mirror records, upserted from provider webhooks.

use atrium_core::AtriumError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};
use crate::models::Customer;

/// Upsert a customer keyed by the provider customer id.
pub async fn upsert_customer(
    db: &Database,
    user_id: &str,
    provider_customer_id: &str,
    email: &str,
    name: Option<&str>,
) -> Result<(), AtriumError> {
    let id = Uuid::new_v4().to_string();
    let user_id = user_id.to_string();
    let provider_customer_id = provider_customer_id.to_string();
    let email = email.to_string();
    let name = name.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customers (id, user_id, provider_customer_id, email, name)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(provider_customer_id) DO UPDATE SET
                   email = excluded.email,
                   name = excluded.name",
                params![id, user_id, provider_customer_id, email, name],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find a customer by provider customer id.
pub async fn find_by_provider_id(
    db: &Database,
    provider_customer_id: &str,
) -> Result<Option<Customer>, AtriumError> {
    let provider_customer_id = provider_customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, user_id, provider_customer_id, email, name, created_at
                 FROM customers WHERE provider_customer_id = ?1",
                params![provider_customer_id],
                |row| {
                    Ok(Customer {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        provider_customer_id: row.get(2)?,
                        email: row.get(3)?,
                        name: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(customer) => Ok(Some(customer)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Find a customer by the user's email (used to attach provider customers
/// to portal users on first sighting).
pub async fn find_user_id_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<String>, AtriumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            );
            match result {
                Ok(id) => Ok(Some(id)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}
