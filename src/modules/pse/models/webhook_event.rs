use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::{AppError, Result};

/// Decoded inbound PSE webhook
///
/// Field names follow the gateway's wire format. The event is created
/// and consumed within a single reconciliation call; the only state it
/// shares with concurrent deliveries is the transaction code used as
/// the idempotency key.
#[derive(Debug, Clone, Deserialize)]
pub struct PseWebhookEvent {
    /// Gateway-assigned transaction code, the idempotency key
    pub x_transaction_id: String,

    /// Gateway response code, mapped by the status table
    pub x_response_code: String,

    /// Amount as decimal text, exactly as signed by the gateway
    pub x_amount: String,

    pub x_currency_code: String,

    /// Correlation field carrying the invoice id as decimal text
    pub x_extra1: String,

    /// Merchant payment reference echoed back by the gateway
    #[serde(default)]
    pub x_reference_payco: Option<String>,

    /// Hex digest authenticating the event
    pub x_signature: String,
}

impl PseWebhookEvent {
    /// Invoice id from the correlation field
    pub fn invoice_id(&self) -> Result<i64> {
        self.x_extra1.trim().parse().map_err(|_| {
            AppError::malformed(format!(
                "x_extra1 '{}' does not carry a numeric invoice id",
                self.x_extra1
            ))
        })
    }

    /// Paid amount from the signed amount field
    pub fn amount(&self) -> Result<Decimal> {
        self.x_amount
            .trim()
            .parse()
            .map_err(|_| AppError::malformed(format!("x_amount '{}' is not a decimal", self.x_amount)))
    }
}
