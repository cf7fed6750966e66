// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod customers;
pub mod disputes;
pub mod documents;
pub mod invoices;
pub mod messages;
pub mod notifications;
pub mod payment_methods;
pub mod payments;
pub mod presence;
pub mod rooms;
pub mod sessions;
pub mod subscriptions;
pub mod users;
pub mod webhook_events;
pub mod whiteboards;
