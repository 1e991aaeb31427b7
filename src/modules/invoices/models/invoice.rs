use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// Invoice status lifecycle
///
/// The reconciliation engine only ever moves invoices between Pending
/// and Paid. Overdue is set by the time-driven sweep, never by webhook
/// processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Awaiting payment
    #[serde(rename = "pending")]
    Pending,

    /// Settled by at least one approved payment
    #[serde(rename = "paid")]
    Paid,

    /// Past its due date without payment
    #[serde(rename = "overdue")]
    Overdue,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Overdue => write!(f, "overdue"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// A monthly service invoice
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,

    pub customer_id: i64,

    /// Billing period, `YYYY-MM`
    pub period: String,

    pub amount: Decimal,

    pub due_date: NaiveDate,

    /// Merchant-generated correlation string embedded in outbound
    /// intents and echoed back by the gateway
    pub payment_reference: String,

    pub status: InvoiceStatus,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating an invoice
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub customer_id: i64,
    pub period: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

impl NewInvoice {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation("Invoice amount must be positive"));
        }
        if !is_valid_period(&self.period) {
            return Err(AppError::validation(format!(
                "Invalid billing period '{}', expected YYYY-MM",
                self.period
            )));
        }
        Ok(())
    }
}

fn is_valid_period(period: &str) -> bool {
    let bytes = period.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    let year_ok = period[..4].chars().all(|c| c.is_ascii_digit());
    let month_ok = matches!(period[5..].parse::<u8>(), Ok(1..=12));
    year_ok && month_ok
}

/// Outcome of generating a billing period's invoices in bulk
#[derive(Debug, Clone, Serialize)]
pub struct BulkGenerationReport {
    /// Invoices created in this run
    pub created: usize,

    /// Active customers considered
    pub total_customers: usize,

    /// Customers skipped because they were already invoiced for the
    /// period, one message each
    pub skipped: Vec<String>,
}

/// Build the payment reference for an invoice: `BP` + zero-padded
/// customer id + zero-padded invoice id + last six digits of the
/// creation timestamp in milliseconds.
pub fn payment_reference(customer_id: i64, invoice_id: i64, epoch_millis: i64) -> String {
    let millis = format!("{:06}", epoch_millis.max(0));
    let suffix = &millis[millis.len() - 6..];
    format!("BP{:04}{:04}{}", customer_id, invoice_id, suffix)
}
