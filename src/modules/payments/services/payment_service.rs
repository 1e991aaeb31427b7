use std::sync::Arc;

use rust_decimal::Decimal;

use super::super::models::{NewPayment, Payment, PaymentMethod, PaymentStats, TransactionStatus};
use super::super::repositories::PaymentRepository;
use crate::core::{AppError, Result};
use crate::modules::invoices::{InvoiceRepository, InvoiceStatus};

/// Manual payment recording and payment queries
///
/// PSE webhook payments never pass through here; those are owned by the
/// reconciliation engine.
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    invoices: Arc<dyn InvoiceRepository>,
}

impl PaymentService {
    pub fn new(payments: Arc<dyn PaymentRepository>, invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { payments, invoices }
    }

    /// Record a cash or transfer payment taken outside the gateway
    ///
    /// An approved manual payment settles the invoice. Recording against
    /// an already-paid invoice is rejected.
    pub async fn record_manual_payment(
        &self,
        invoice_id: i64,
        amount_paid: Decimal,
        method: PaymentMethod,
        status: TransactionStatus,
    ) -> Result<Payment> {
        if method == PaymentMethod::Pse {
            return Err(AppError::validation(
                "PSE payments are recorded through webhook reconciliation",
            ));
        }
        if amount_paid <= Decimal::ZERO {
            return Err(AppError::validation("Payment amount must be positive"));
        }

        let invoice = self
            .invoices
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", invoice_id)))?;

        if invoice.status == InvoiceStatus::Paid {
            return Err(AppError::AlreadyPaid(invoice.id));
        }

        let payment = self
            .payments
            .insert(&NewPayment {
                invoice_id,
                amount_paid,
                method,
                status,
                transaction_code: None,
            })
            .await?;

        if payment.is_approved() {
            self.invoices
                .update_status(invoice_id, InvoiceStatus::Paid)
                .await?;
        }

        tracing::info!(
            payment_id = payment.id,
            invoice_id,
            method = %method,
            status = %status,
            "Manual payment recorded"
        );

        Ok(payment)
    }

    pub async fn get_payment(&self, id: i64) -> Result<Payment> {
        self.payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {} not found", id)))
    }

    pub async fn list_invoice_payments(&self, invoice_id: i64) -> Result<Vec<Payment>> {
        self.invoices
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", invoice_id)))?;

        self.payments.find_by_invoice(invoice_id).await
    }

    pub async fn payment_stats(&self) -> Result<PaymentStats> {
        self.payments.stats().await
    }
}
