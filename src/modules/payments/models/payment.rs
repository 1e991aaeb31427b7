use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Bank transfer through the PSE rail
    #[serde(rename = "pse")]
    Pse,

    #[serde(rename = "cash")]
    Cash,

    #[serde(rename = "transfer")]
    Transfer,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Pse => write!(f, "pse"),
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Transfer => write!(f, "transfer"),
        }
    }
}

/// Outcome of a payment attempt as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
pub enum TransactionStatus {
    #[serde(rename = "approved")]
    Approved,

    #[serde(rename = "rejected")]
    Rejected,

    #[serde(rename = "pending")]
    Pending,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Approved => write!(f, "approved"),
            TransactionStatus::Rejected => write!(f, "rejected"),
            TransactionStatus::Pending => write!(f, "pending"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "approved" => Ok(TransactionStatus::Approved),
            "rejected" => Ok(TransactionStatus::Rejected),
            "pending" => Ok(TransactionStatus::Pending),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// A payment recorded against an invoice
///
/// `transaction_code` is the gateway-assigned external code and the
/// idempotency key for webhook reconciliation: at most one payment row
/// ever exists per code, enforced by a unique index. Manual cash and
/// transfer payments carry no code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,

    pub invoice_id: i64,

    pub amount_paid: Decimal,

    pub method: PaymentMethod,

    pub status: TransactionStatus,

    pub transaction_code: Option<String>,

    #[serde(skip_deserializing)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_approved(&self) -> bool {
        self.status == TransactionStatus::Approved
    }
}

/// Payload for inserting a payment row
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub invoice_id: i64,
    pub amount_paid: Decimal,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    pub transaction_code: Option<String>,
}

/// Aggregate payment counters and totals per transaction status
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStats {
    pub total_count: i64,
    pub approved_count: i64,
    pub rejected_count: i64,
    pub pending_count: i64,
    pub approved_total: Decimal,
    pub rejected_total: Decimal,
    pub pending_total: Decimal,
}
