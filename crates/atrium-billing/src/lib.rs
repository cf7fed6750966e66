// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment-provider webhook reconciler.
//!
//! Verifies inbound event signatures, records every event for idempotent
//! replay/audit, and synchronizes local customer/subscription/payment/
//! invoice/dispute records from the event payload. Local status fields are
//! always translations of the provider's status strings through fixed
//! lookup tables with explicit defaults.

pub mod event;
pub mod reconciler;
pub mod routes;
pub mod signature;
pub mod status;

pub use event::ProviderEvent;
pub use reconciler::Reconciler;
pub use routes::{router, WebhookState};
pub use signature::SIGNATURE_HEADER;
