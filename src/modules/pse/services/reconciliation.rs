use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::super::models::PseWebhookEvent;
use super::signature::SignatureCodec;
use super::status_map::map_response_code;
use crate::core::{AppError, Result};
use crate::modules::invoices::{InvoiceRepository, InvoiceStatus};
use crate::modules::payments::{
    NewPayment, Payment, PaymentMethod, PaymentRepository, TransactionStatus,
};

/// Outcome of reconciling one webhook delivery
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    /// The payment row this event landed on, created or updated
    pub payment: Payment,

    /// Invoice status after propagation
    pub invoice_status: InvoiceStatus,

    /// True when the event was an identical redelivery with no
    /// observable effect
    pub duplicate: bool,
}

/// Reconciles gateway webhooks against payment and invoice state
///
/// Webhooks arrive at-least-once, concurrently and out of order.
/// Processing for one delivery is: verify signature, resolve the
/// payment row by transaction code, then propagate to the invoice.
/// Mutations for the same transaction code are serialized through a
/// keyed mutex; the unique index on the code is the storage-level
/// backstop, so two racing deliveries can never both create a row.
pub struct ReconciliationEngine {
    codec: SignatureCodec,
    invoices: Arc<dyn InvoiceRepository>,
    payments: Arc<dyn PaymentRepository>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReconciliationEngine {
    pub fn new(
        codec: SignatureCodec,
        invoices: Arc<dyn InvoiceRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            codec,
            invoices,
            payments,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile one decoded webhook event
    ///
    /// Signature and correlation failures reject the event before any
    /// write; a payment row only ever exists for an authenticated
    /// event. Invoice-not-found is fatal for the event.
    pub async fn reconcile(&self, event: &PseWebhookEvent) -> Result<ReconciliationResult> {
        if !self.codec.verify(
            &event.x_transaction_id,
            &event.x_amount,
            &event.x_currency_code,
            &event.x_signature,
        ) {
            tracing::warn!(
                transaction_id = %event.x_transaction_id,
                "Webhook rejected: signature mismatch"
            );
            return Err(AppError::InvalidSignature);
        }

        let invoice_id = event.invoice_id()?;
        let amount = event.amount()?;
        let status = map_response_code(&event.x_response_code);

        let key_lock = self.lock_for(&event.x_transaction_id).await;
        let result = {
            let _guard = key_lock.lock().await;
            self.apply(event, invoice_id, amount, status).await
        };
        self.evict_lock(&event.x_transaction_id, key_lock).await;

        result
    }

    /// Locked section: resolve the payment row for the event's
    /// transaction code and propagate the outcome to the invoice.
    async fn apply(
        &self,
        event: &PseWebhookEvent,
        invoice_id: i64,
        amount: rust_decimal::Decimal,
        status: TransactionStatus,
    ) -> Result<ReconciliationResult> {
        let invoice = self
            .invoices
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", invoice_id)))?;

        let existing = self
            .payments
            .find_by_transaction_code(&event.x_transaction_id)
            .await?;

        let (payment, duplicate) = match existing {
            None => {
                let payment = self
                    .payments
                    .insert(&NewPayment {
                        invoice_id,
                        amount_paid: amount,
                        method: PaymentMethod::Pse,
                        status,
                        transaction_code: Some(event.x_transaction_id.clone()),
                    })
                    .await?;

                tracing::info!(
                    payment_id = payment.id,
                    invoice_id,
                    transaction_id = %event.x_transaction_id,
                    status = %status,
                    "Payment created from webhook"
                );

                (payment, false)
            }
            Some(existing) if existing.status == status => {
                // identical redelivery; observable no-op
                tracing::info!(
                    payment_id = existing.id,
                    transaction_id = %event.x_transaction_id,
                    "Duplicate webhook delivery ignored"
                );
                (existing, true)
            }
            Some(existing) => {
                let updated = self
                    .payments
                    .update_reconciliation(existing.id, status, &event.x_transaction_id)
                    .await?;

                tracing::info!(
                    payment_id = updated.id,
                    transaction_id = %event.x_transaction_id,
                    from = %existing.status,
                    to = %status,
                    "Payment status updated from webhook"
                );

                (updated, false)
            }
        };

        let invoice_status = self.propagate_to_invoice(invoice.id, invoice.status, &payment).await?;

        Ok(ReconciliationResult {
            payment,
            invoice_status,
            duplicate,
        })
    }

    /// Propagate a payment outcome to its invoice
    ///
    /// Ordering rules against flapping:
    /// - approved settles a not-yet-paid invoice;
    /// - rejected reverts a paid invoice only when no approved payment
    ///   remains, so a rejection for one payment never undoes an
    ///   invoice settled by a different, still-approved payment;
    /// - pending never touches the invoice.
    async fn propagate_to_invoice(
        &self,
        invoice_id: i64,
        invoice_status: InvoiceStatus,
        payment: &Payment,
    ) -> Result<InvoiceStatus> {
        match payment.status {
            TransactionStatus::Approved if invoice_status != InvoiceStatus::Paid => {
                self.invoices
                    .update_status(invoice_id, InvoiceStatus::Paid)
                    .await?;

                tracing::info!(invoice_id, payment_id = payment.id, "Invoice marked paid");
                Ok(InvoiceStatus::Paid)
            }
            TransactionStatus::Rejected if invoice_status == InvoiceStatus::Paid => {
                let approved_remaining =
                    self.payments.count_approved_for_invoice(invoice_id).await?;

                if approved_remaining == 0 {
                    self.invoices
                        .update_status(invoice_id, InvoiceStatus::Pending)
                        .await?;

                    tracing::warn!(
                        invoice_id,
                        payment_id = payment.id,
                        "Invoice reverted to pending after rejection of its settling payment"
                    );
                    Ok(InvoiceStatus::Pending)
                } else {
                    Ok(invoice_status)
                }
            }
            _ => Ok(invoice_status),
        }
    }

    /// Mutex for one transaction code; entries are created on first use
    async fn lock_for(&self, transaction_code: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(transaction_code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a code's lock entry once no other task holds it, so the map
    /// does not grow with every distinct code the process ever saw.
    /// Cloning out of the map requires the map lock, so the count check
    /// and the removal are atomic against new arrivals; a waiter that
    /// already holds a clone keeps the entry alive and evicts it itself
    /// when it finishes.
    async fn evict_lock(&self, transaction_code: &str, key_lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // two owners left: the map and this task
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(transaction_code);
        }
    }

    /// Number of per-code lock entries currently retained
    pub async fn active_lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}
