// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event dispatch and per-type sync handlers.
//!
//! Every sync is an upsert keyed by the provider object id, translating
//! provider status strings through the fixed tables in [`crate::status`].
//! Events referencing an unknown customer are warned and skipped rather
//! than failed: the provider will not have better luck on redelivery.
//! Notifications created inside syncs are best-effort; a notification
//! failure never fails the webhook.

use tracing::{debug, info, warn};

use atrium_core::AtriumError;
use atrium_storage::queries::{
    customers, disputes, invoices, notifications, payment_methods, payments, subscriptions,
};
use atrium_storage::queries::disputes::DisputeSync;
use atrium_storage::queries::invoices::InvoiceSync;
use atrium_storage::queries::payments::PaymentSync;
use atrium_storage::queries::subscriptions::SubscriptionSync;
use atrium_storage::{Customer, Database};

use crate::event::{
    unix_to_rfc3339, ChargeObject, CustomerObject, InvoiceObject, PaymentIntentObject,
    PaymentMethodObject, ProviderEvent, SetupIntentObject, SubscriptionObject,
};
use crate::status::{
    PaymentStatus, SubscriptionStatus, DISPUTE_REASON, DISPUTE_STATUS, INVOICE_STATUS,
    PAYMENT_STATUS, SUBSCRIPTION_STATUS,
};

/// Synchronizes local billing records from provider webhook events.
pub struct Reconciler {
    db: Database,
}

impl Reconciler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Dispatch one event by type.
    ///
    /// Unknown event types are logged and succeed: the provider must not
    /// retry something this reconciler intentionally ignores.
    pub async fn process(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        debug!(event = %event.id, event_type = %event.event_type, "processing webhook event");
        match event.event_type.as_str() {
            "customer.created" | "customer.updated" => self.sync_customer(event).await,

            "customer.subscription.created" | "customer.subscription.updated" => {
                self.sync_subscription(event).await
            }
            "customer.subscription.deleted" => self.delete_subscription(event).await,
            "customer.subscription.trial_will_end" => self.notify_trial_ending(event).await,

            "payment_method.attached" | "payment_method.updated" => {
                self.sync_payment_method(event).await
            }
            "payment_method.detached" => self.detach_payment_method(event).await,

            "invoice.created" | "invoice.updated" | "invoice.paid" | "invoice.payment_failed"
            | "invoice.payment_action_required" => self.sync_invoice(event).await,

            "payment_intent.succeeded" | "payment_intent.payment_failed"
            | "payment_intent.requires_action" => self.sync_payment_intent(event).await,

            "charge.succeeded" | "charge.failed" | "charge.dispute.created" => {
                self.sync_charge(event).await
            }

            "setup_intent.succeeded" | "setup_intent.setup_failed" => {
                self.sync_setup_intent(event).await
            }

            other => {
                info!(event_type = %other, "unhandled webhook event type");
                Ok(())
            }
        }
    }

    // --- customers ---

    async fn sync_customer(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: CustomerObject = event.object()?;

        let user_id = match customers::find_by_provider_id(&self.db, &object.id).await? {
            Some(existing) => existing.user_id,
            None => match customers::find_user_id_by_email(&self.db, &object.email).await? {
                Some(user_id) => user_id,
                None => {
                    warn!(customer = %object.id, "no portal user for provider customer, skipping");
                    return Ok(());
                }
            },
        };

        customers::upsert_customer(
            &self.db,
            &user_id,
            &object.id,
            &object.email,
            object.name.as_deref(),
        )
        .await
    }

    /// Resolve the local customer for a provider customer id. Events for
    /// unknown customers are skipped with a warning.
    async fn require_customer(
        &self,
        provider_customer_id: Option<&str>,
    ) -> Result<Option<Customer>, AtriumError> {
        let Some(id) = provider_customer_id else {
            warn!("event carries no customer reference, skipping");
            return Ok(None);
        };
        let customer = customers::find_by_provider_id(&self.db, id).await?;
        if customer.is_none() {
            warn!(customer = %id, "customer not found locally, skipping");
        }
        Ok(customer)
    }

    // --- subscriptions ---

    async fn sync_subscription(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: SubscriptionObject = event.object()?;
        let Some(customer) = self.require_customer(object.customer.as_deref()).await? else {
            return Ok(());
        };

        let sync = SubscriptionSync {
            provider_subscription_id: object.id.clone(),
            status: SUBSCRIPTION_STATUS.map(&object.status).to_string(),
            current_period_start: object.current_period_start.and_then(unix_to_rfc3339),
            current_period_end: object.current_period_end.and_then(unix_to_rfc3339),
            trial_start: object.trial_start.and_then(unix_to_rfc3339),
            trial_end: object.trial_end.and_then(unix_to_rfc3339),
            canceled_at: object.canceled_at.and_then(unix_to_rfc3339),
            cancel_at_period_end: object.cancel_at_period_end,
        };
        subscriptions::upsert_subscription(&self.db, &customer.user_id, &customer.id, sync).await
    }

    async fn delete_subscription(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: SubscriptionObject = event.object()?;
        subscriptions::cancel_subscription(
            &self.db,
            &object.id,
            &SubscriptionStatus::Canceled.to_string(),
            object.canceled_at.and_then(unix_to_rfc3339).as_deref(),
        )
        .await
    }

    async fn notify_trial_ending(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: SubscriptionObject = event.object()?;
        let Some(subscription) =
            subscriptions::find_by_provider_id(&self.db, &object.id).await?
        else {
            warn!(subscription = %object.id, "trial notice for unknown subscription, skipping");
            return Ok(());
        };
        self.notify(
            &subscription.user_id,
            "Trial Ending Soon",
            "Your trial period will end soon. Please update your payment method to \
             continue using our services.",
        )
        .await;
        Ok(())
    }

    // --- payment methods ---

    async fn sync_payment_method(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: PaymentMethodObject = event.object()?;
        let Some(customer) = self.require_customer(object.customer.as_deref()).await? else {
            return Ok(());
        };
        let card = object.card.as_ref();
        payment_methods::upsert_payment_method(
            &self.db,
            &customer.id,
            &object.id,
            &object.kind,
            card.and_then(|c| c.brand.as_deref()),
            card.and_then(|c| c.last4.as_deref()),
        )
        .await
    }

    async fn detach_payment_method(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: PaymentMethodObject = event.object()?;
        payment_methods::detach_payment_method(&self.db, &object.id).await
    }

    // --- invoices ---

    async fn sync_invoice(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: InvoiceObject = event.object()?;
        let Some(customer) = self.require_customer(object.customer.as_deref()).await? else {
            return Ok(());
        };

        // Action-required is notification-only: the invoice itself has not
        // changed state yet.
        if event.event_type != "invoice.payment_action_required" {
            let status = INVOICE_STATUS.map(object.status.as_deref().unwrap_or(""));
            let sync = InvoiceSync {
                provider_invoice_id: object.id.clone(),
                number: object.number.clone().unwrap_or_else(|| object.id.clone()),
                status: status.to_string(),
                currency: object.currency.clone(),
                subtotal: object.subtotal,
                total: object.total,
                amount_paid: object.amount_paid,
                amount_due: object.amount_due,
                amount_remaining: object.amount_remaining,
                period_start: object.period_start.and_then(unix_to_rfc3339),
                period_end: object.period_end.and_then(unix_to_rfc3339),
                paid_at: object
                    .status_transitions
                    .as_ref()
                    .and_then(|t| t.paid_at)
                    .and_then(unix_to_rfc3339),
                hosted_invoice_url: object.hosted_invoice_url.clone(),
            };
            invoices::upsert_invoice(&self.db, &customer.id, sync).await?;
        }

        match event.event_type.as_str() {
            "invoice.paid" => {
                let content = format!(
                    "Your payment of {:.2} {} has been successfully processed.",
                    object.amount_paid as f64 / 100.0,
                    object.currency.to_uppercase()
                );
                self.notify(&customer.user_id, "Payment Received", &content).await;
            }
            "invoice.payment_failed" => {
                self.notify(
                    &customer.user_id,
                    "Payment Failed",
                    "We were unable to process your payment. Please update your payment \
                     method or contact support.",
                )
                .await;
            }
            "invoice.payment_action_required" => {
                self.notify(
                    &customer.user_id,
                    "Payment Action Required",
                    "Your payment requires additional authentication. Please complete the \
                     payment process.",
                )
                .await;
            }
            _ => {}
        }
        Ok(())
    }

    // --- payments ---

    async fn sync_payment_intent(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        let object: PaymentIntentObject = event.object()?;
        let Some(customer) = self.require_customer(object.customer.as_deref()).await? else {
            return Ok(());
        };

        let status = PAYMENT_STATUS.map(&object.status);
        let error = object.last_payment_error.as_ref();
        let sync = PaymentSync {
            provider_payment_intent_id: object.id.clone(),
            amount: object.amount,
            amount_received: object.amount_received,
            currency: object.currency.clone(),
            status: status.to_string(),
            description: object.description.clone(),
            receipt_email: object.receipt_email.clone(),
            processed_at: (status == PaymentStatus::Succeeded)
                .then(atrium_storage::database::now_rfc3339),
            failure_code: error.and_then(|e| e.code.clone()),
            failure_message: error.and_then(|e| e.message.clone()),
        };
        payments::upsert_payment(&self.db, &customer.user_id, &customer.id, sync).await
    }

    // --- charges & disputes ---

    async fn sync_charge(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        if event.event_type != "charge.dispute.created" {
            // Charge success/failure is reflected by the payment-intent
            // events; nothing to mirror here.
            debug!(event_type = %event.event_type, "charge event without local effect");
            return Ok(());
        }

        let object: ChargeObject = event.object()?;
        let Some(dispute) = object.dispute else {
            warn!(charge = %object.id, "dispute event without dispute object, skipping");
            return Ok(());
        };
        let Some(customer) = self.require_customer(object.customer.as_deref()).await? else {
            return Ok(());
        };

        let reason = DISPUTE_REASON.map(dispute.reason.as_deref().unwrap_or(""));
        let status = DISPUTE_STATUS.map(dispute.status.as_deref().unwrap_or(""));
        disputes::upsert_dispute(
            &self.db,
            &customer.user_id,
            DisputeSync {
                provider_dispute_id: dispute.id.clone(),
                amount: dispute.amount,
                currency: dispute.currency.clone(),
                reason: reason.to_string(),
                status: status.to_string(),
                is_charge_refundable: dispute.is_charge_refundable,
            },
        )
        .await?;

        let content = format!(
            "A dispute has been created for a charge of {:.2} {}. We will review and \
             respond accordingly.",
            dispute.amount as f64 / 100.0,
            dispute.currency.to_uppercase()
        );
        self.notify(&customer.user_id, "Payment Dispute", &content).await;
        Ok(())
    }

    // --- setup intents ---

    async fn sync_setup_intent(&self, event: &ProviderEvent) -> Result<(), AtriumError> {
        if event.event_type != "setup_intent.succeeded" {
            debug!(event_type = %event.event_type, "setup intent failure, no local effect");
            return Ok(());
        }
        let object: SetupIntentObject = event.object()?;
        let Some(payment_method) = object.payment_method else {
            warn!(setup_intent = %object.id, "succeeded setup intent without payment method");
            return Ok(());
        };
        let Some(customer) = self.require_customer(object.customer.as_deref()).await? else {
            return Ok(());
        };
        payment_methods::upsert_payment_method(
            &self.db,
            &customer.id,
            &payment_method,
            "card",
            None,
            None,
        )
        .await
    }

    /// Best-effort notification: failures are logged, never propagated.
    async fn notify(&self, user_id: &str, title: &str, content: &str) {
        if let Err(e) =
            notifications::create_notification(&self.db, user_id, title, content, "system").await
        {
            warn!(error = %e, user = %user_id, "notification creation failed");
        }
    }
}
