use rust_decimal::Decimal;
use serde::Serialize;

/// Outbound payment intent, returned to the caller after the gateway
/// accepts a payment-creation request. Transient; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub invoice_id: i64,

    pub amount: Decimal,

    pub payment_reference: String,

    /// Digest computed over the reference and amount
    pub signature: String,

    /// Gateway-assigned transaction id
    pub transaction_id: String,

    /// Bank checkout page the customer is redirected to
    pub redirect_url: String,
}
