// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhook event envelope and per-type object views.
//!
//! The envelope is `{id, type, data: {object}}`. Each sync handler parses
//! `data.object` into the view it needs; all local state is derived from
//! the payload itself -- there is no callback to the provider's API.

use serde::Deserialize;
use serde_json::Value;

use atrium_core::AtriumError;

/// Inbound webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
    /// Provider-unique event id; the idempotency key.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

/// Event payload wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

impl ProviderEvent {
    /// Parse `data.object` into a typed view.
    pub fn object<T: serde::de::DeserializeOwned>(&self) -> Result<T, AtriumError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| AtriumError::Webhook {
            message: format!("malformed {} object: {e}", self.event_type),
            source: Some(Box::new(e)),
        })
    }
}

/// Customer object fields consumed by the customer sync.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerObject {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Subscription object fields consumed by the subscription sync.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub trial_start: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub canceled_at: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Card details embedded in a payment method object.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
}

/// Payment method object fields consumed by the payment-method sync.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(rename = "type", default = "default_payment_method_kind")]
    pub kind: String,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

fn default_payment_method_kind() -> String {
    "card".to_string()
}

/// Paid-at transition timestamps on an invoice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusTransitions {
    #[serde(default)]
    pub paid_at: Option<i64>,
}

/// Invoice object fields consumed by the invoice sync.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub subtotal: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub amount_remaining: i64,
    #[serde(default)]
    pub period_start: Option<i64>,
    #[serde(default)]
    pub period_end: Option<i64>,
    #[serde(default)]
    pub status_transitions: Option<StatusTransitions>,
    #[serde(default)]
    pub hosted_invoice_url: Option<String>,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Failure details on a payment intent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payment intent object fields consumed by the payment sync.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub amount_received: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

/// Dispute object embedded in a charge.
#[derive(Debug, Clone, Deserialize)]
pub struct DisputeObject {
    pub id: String,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_charge_refundable: bool,
}

/// Charge object fields consumed by the charge/dispute sync.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub dispute: Option<DisputeObject>,
}

/// Setup intent object fields consumed by the setup-intent sync.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupIntentObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Convert a provider unix timestamp to millisecond-precision RFC 3339.
pub fn unix_to_rfc3339(timestamp: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
