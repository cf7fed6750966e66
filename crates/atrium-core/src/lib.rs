// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Atrium portal backend.
//!
//! Provides the error taxonomy, shared identity and id types, and the trait
//! seams consumed by the collaboration gateway and the webhook reconciler.

pub mod error;
pub mod traits;
pub mod types;

pub use error::AtriumError;
pub use traits::SessionVerifier;
pub use types::{ConnId, Identity, MessageKind, RoomId, RoomStatus};
