// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! Wire-facing types (those broadcast to WebSocket clients) serialize in
//! camelCase to match the client protocol; internal records keep plain
//! field names.

use serde::{Deserialize, Serialize};

/// A portal user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// A durable consultation room record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub created_by: String,
    /// One of `scheduled`, `active`, `completed`, `cancelled`.
    pub status: String,
    pub created_at: String,
}

/// Input for creating a chat message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room_id: String,
    pub sender_id: String,
    pub content: String,
    /// One of `text`, `file`, `system`.
    pub kind: String,
    pub reply_to_id: Option<String>,
}

/// Sender identity embedded in a broadcast message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSender {
    pub id: String,
    pub name: String,
}

/// Preview of the message being replied to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPreview {
    pub id: String,
    pub content: String,
    pub sender: MessageSender,
}

/// A persisted chat message with its sender and reply-to reference
/// resolved, in the shape broadcast to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub room_id: String,
    pub content: String,
    pub kind: String,
    pub sender: MessageSender,
    pub reply_to: Option<ReplyPreview>,
    /// JSON object of emoji -> user id list. Opaque to this subsystem.
    pub reactions: serde_json::Value,
    pub created_at: String,
}

/// Per-user presence record. Exactly one row per user, last writer wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub user_id: String,
    pub is_online: bool,
    pub room_id: Option<String>,
    pub last_seen: String,
}

/// A saved whiteboard snapshot, keyed by (room, creator).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Whiteboard {
    pub id: String,
    pub room_id: String,
    pub created_by: String,
    pub name: String,
    /// Opaque drawing payload (serialized canvas state).
    pub data: String,
    pub updated_at: String,
}

/// A collaborative document with a monotonically increasing version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub room_id: String,
    pub title: String,
    pub content: String,
    pub version: i64,
    pub updated_at: String,
}

/// An immutable snapshot row appended on every successful document save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub id: i64,
    pub document_id: String,
    pub content: String,
    pub version: i64,
    pub created_by: String,
    pub created_at: String,
}

/// A user-facing notification, delivered over the personal channel when the
/// target user has a live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Audit/idempotency record for every received payment-provider event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    pub id: i64,
    pub provider_event_id: String,
    pub event_type: String,
    pub payload: String,
    pub processed: bool,
    pub processed_at: Option<String>,
    pub processing_error: Option<String>,
    pub retry_count: i64,
    pub received_at: String,
}

/// Local mirror of a provider customer.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: String,
    pub user_id: String,
    pub provider_customer_id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: String,
}

/// Local mirror of a provider subscription. `status` is always a
/// translation of the provider's status string, never advanced locally.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub customer_id: String,
    pub provider_subscription_id: String,
    pub status: String,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub trial_start: Option<String>,
    pub trial_end: Option<String>,
    pub canceled_at: Option<String>,
    pub cancel_at_period_end: bool,
}

/// Local mirror of a provider payment intent.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub customer_id: String,
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

/// Local mirror of a provider invoice.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: String,
    pub customer_id: String,
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

/// Local mirror of a provider payment method.
#[derive(Debug, Clone)]
pub struct PaymentMethod {
    pub id: String,
    pub customer_id: String,
    pub provider_payment_method_id: String,
    pub kind: String,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub is_active: bool,
}

/// Local mirror of a provider charge dispute.
#[derive(Debug, Clone)]
pub struct Dispute {
    pub id: String,
    pub user_id: String,
    pub provider_dispute_id: String,
    pub amount: i64,
    pub currency: String,
    pub reason: String,
    pub status: String,
    pub is_charge_refundable: bool,
}
