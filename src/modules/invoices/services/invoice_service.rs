use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::super::models::{BulkGenerationReport, Invoice, NewInvoice};
use super::super::repositories::InvoiceRepository;
use crate::core::{AppError, Result};
use crate::modules::customers::CustomerRepository;

/// Invoice management service
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceRepository>,
    customers: Arc<dyn CustomerRepository>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        customers: Arc<dyn CustomerRepository>,
    ) -> Self {
        Self {
            invoices,
            customers,
        }
    }

    /// Create an invoice for a customer's billing period
    ///
    /// Rejects unknown customers and duplicate (customer, period) pairs.
    pub async fn create_invoice(&self, new: NewInvoice) -> Result<Invoice> {
        new.validate()?;

        self.customers
            .find_by_id(new.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Customer {} not found", new.customer_id))
            })?;

        if self
            .invoices
            .find_by_customer_and_period(new.customer_id, &new.period)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Invoice for customer {} in period '{}' already exists",
                new.customer_id, new.period
            )));
        }

        let invoice = self.invoices.create(&new).await?;

        tracing::info!(
            invoice_id = invoice.id,
            customer_id = invoice.customer_id,
            period = %invoice.period,
            reference = %invoice.payment_reference,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Generate the month's invoices for every active customer
    ///
    /// The recurring-billing batch: one invoice per active customer for
    /// the period, at the given flat amount. Customers already invoiced
    /// for the period are skipped and reported, so the operation can be
    /// re-run safely after a partial failure.
    pub async fn generate_for_period(
        &self,
        period: &str,
        due_date: NaiveDate,
        amount: Decimal,
    ) -> Result<BulkGenerationReport> {
        NewInvoice {
            customer_id: 0,
            period: period.to_string(),
            amount,
            due_date,
        }
        .validate()?;

        let customers = self.customers.list_active().await?;
        if customers.is_empty() {
            return Err(AppError::validation(
                "No active customers to generate invoices for",
            ));
        }

        let mut created = 0;
        let mut skipped = Vec::new();

        for customer in &customers {
            if self
                .invoices
                .find_by_customer_and_period(customer.id, period)
                .await?
                .is_some()
            {
                skipped.push(format!(
                    "Customer {} ({}) already invoiced for {}",
                    customer.name, customer.document, period
                ));
                continue;
            }

            let result = self
                .invoices
                .create(&NewInvoice {
                    customer_id: customer.id,
                    period: period.to_string(),
                    amount,
                    due_date,
                })
                .await;

            match result {
                Ok(_) => created += 1,
                // lost a race with a concurrent creation for the same period
                Err(AppError::Conflict(message)) => skipped.push(message),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            period,
            created,
            skipped = skipped.len(),
            total = customers.len(),
            "Bulk invoice generation finished"
        );

        Ok(BulkGenerationReport {
            created,
            total_customers: customers.len(),
            skipped,
        })
    }

    pub async fn get_invoice(&self, id: i64) -> Result<Invoice> {
        self.invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", id)))
    }

    pub async fn list_invoices(&self, limit: i64, offset: i64) -> Result<Vec<Invoice>> {
        self.invoices.list(limit, offset).await
    }

    pub async fn list_customer_invoices(&self, customer_id: i64) -> Result<Vec<Invoice>> {
        self.customers
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", customer_id)))?;

        self.invoices.find_by_customer(customer_id).await
    }

    /// Time-driven sweep: pending invoices past their due date become
    /// overdue. Run periodically; webhook processing never calls this.
    pub async fn mark_overdue_invoices(&self) -> Result<u64> {
        let today = chrono::Utc::now().date_naive();
        let transitioned = self.invoices.mark_overdue(today).await?;

        if transitioned > 0 {
            tracing::info!(count = transitioned, "Invoices marked overdue");
        }

        Ok(transitioned)
    }
}
