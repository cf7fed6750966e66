// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-to-local status translation tables.
//!
//! Each provider enum gets one typed lookup table with a mandatory default:
//! an unrecognized provider status maps to the documented default instead
//! of failing, so new provider statuses never break webhook processing.
//! Local status columns are always a translation of the provider's string,
//! never advanced independently.

use strum::{Display, EnumString};

/// Fixed lookup table from provider status strings to a local enum.
pub struct StatusTable<T: Copy + 'static> {
    entries: &'static [(&'static str, T)],
    default: T,
}

impl<T: Copy + 'static> StatusTable<T> {
    pub const fn new(entries: &'static [(&'static str, T)], default: T) -> Self {
        Self { entries, default }
    }

    /// Translate a provider status, falling back to the table default.
    pub fn map(&self, provider_status: &str) -> T {
        self.entries
            .iter()
            .find(|(key, _)| *key == provider_status)
            .map(|(_, value)| *value)
            .unwrap_or(self.default)
    }
}

/// Local subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Unpaid,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Trialing,
    Paused,
}

pub const SUBSCRIPTION_STATUS: StatusTable<SubscriptionStatus> = StatusTable::new(
    &[
        ("active", SubscriptionStatus::Active),
        ("past_due", SubscriptionStatus::PastDue),
        ("unpaid", SubscriptionStatus::Unpaid),
        ("canceled", SubscriptionStatus::Canceled),
        ("incomplete", SubscriptionStatus::Incomplete),
        ("incomplete_expired", SubscriptionStatus::IncompleteExpired),
        ("trialing", SubscriptionStatus::Trialing),
        ("paused", SubscriptionStatus::Paused),
    ],
    SubscriptionStatus::Active,
);

/// Local payment (payment-intent) status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Pending,
}

pub const PAYMENT_STATUS: StatusTable<PaymentStatus> = StatusTable::new(
    &[
        ("requires_payment_method", PaymentStatus::RequiresPaymentMethod),
        ("requires_confirmation", PaymentStatus::RequiresConfirmation),
        ("requires_action", PaymentStatus::RequiresAction),
        ("processing", PaymentStatus::Processing),
        ("requires_capture", PaymentStatus::RequiresCapture),
        ("canceled", PaymentStatus::Canceled),
        ("succeeded", PaymentStatus::Succeeded),
    ],
    PaymentStatus::Pending,
);

/// Local invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
    Void,
    Uncollectible,
}

pub const INVOICE_STATUS: StatusTable<InvoiceStatus> = StatusTable::new(
    &[
        ("draft", InvoiceStatus::Draft),
        ("open", InvoiceStatus::Open),
        ("paid", InvoiceStatus::Paid),
        ("void", InvoiceStatus::Void),
        ("uncollectible", InvoiceStatus::Uncollectible),
    ],
    InvoiceStatus::Draft,
);

/// Local dispute reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DisputeReason {
    CreditNotProcessed,
    Duplicate,
    Fraudulent,
    General,
    IncorrectAccountDetails,
    InsufficientFunds,
    ProductNotReceived,
    ProductUnacceptable,
    SubscriptionCanceled,
    Unrecognized,
}

pub const DISPUTE_REASON: StatusTable<DisputeReason> = StatusTable::new(
    &[
        ("credit_not_processed", DisputeReason::CreditNotProcessed),
        ("duplicate", DisputeReason::Duplicate),
        ("fraudulent", DisputeReason::Fraudulent),
        ("general", DisputeReason::General),
        ("incorrect_account_details", DisputeReason::IncorrectAccountDetails),
        ("insufficient_funds", DisputeReason::InsufficientFunds),
        ("product_not_received", DisputeReason::ProductNotReceived),
        ("product_unacceptable", DisputeReason::ProductUnacceptable),
        ("subscription_canceled", DisputeReason::SubscriptionCanceled),
        ("unrecognized", DisputeReason::Unrecognized),
    ],
    DisputeReason::General,
);

/// Local dispute status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DisputeStatus {
    WarningNeedsResponse,
    WarningUnderReview,
    WarningClosed,
    NeedsResponse,
    UnderReview,
    ChargeRefunded,
    Won,
    Lost,
}

pub const DISPUTE_STATUS: StatusTable<DisputeStatus> = StatusTable::new(
    &[
        ("warning_needs_response", DisputeStatus::WarningNeedsResponse),
        ("warning_under_review", DisputeStatus::WarningUnderReview),
        ("warning_closed", DisputeStatus::WarningClosed),
        ("needs_response", DisputeStatus::NeedsResponse),
        ("under_review", DisputeStatus::UnderReview),
        ("charge_refunded", DisputeStatus::ChargeRefunded),
        ("won", DisputeStatus::Won),
        ("lost", DisputeStatus::Lost),
    ],
    DisputeStatus::NeedsResponse,
);
