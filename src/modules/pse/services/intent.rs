use std::sync::Arc;

use super::super::models::PaymentIntent;
use super::pse_client::{CreatePaymentRequest, PseGateway};
use super::signature::{SignatureCodec, CURRENCY_COP};
use crate::core::{AppError, Result};
use crate::modules::customers::Customer;
use crate::modules::invoices::{Invoice, InvoiceStatus};

const DOCUMENT_TYPE_CEDULA: &str = "CC";
const FALLBACK_CUSTOMER_EMAIL: &str = "cliente@bigpagos.com";

/// Composes outbound payment-creation requests for the PSE gateway
///
/// Persists nothing; the caller owns any bookkeeping around the
/// returned intent.
pub struct PaymentIntentBuilder {
    codec: SignatureCodec,
    gateway: Arc<dyn PseGateway>,
    public_base_url: String,
    default_bank_code: String,
}

impl PaymentIntentBuilder {
    pub fn new(
        codec: SignatureCodec,
        gateway: Arc<dyn PseGateway>,
        public_base_url: String,
        default_bank_code: String,
    ) -> Self {
        Self {
            codec,
            gateway,
            public_base_url,
            default_bank_code,
        }
    }

    /// Build a payment intent for a pending invoice
    ///
    /// A settled invoice is rejected before any gateway traffic.
    pub async fn build(&self, invoice: &Invoice, customer: &Customer) -> Result<PaymentIntent> {
        if invoice.status == InvoiceStatus::Paid {
            return Err(AppError::AlreadyPaid(invoice.id));
        }

        let amount = invoice.amount.normalize().to_string();
        let signature = self.codec.sign(&amount, &invoice.payment_reference);

        let request = CreatePaymentRequest {
            p_cust_id_cliente: customer.id.to_string(),
            p_amount: amount,
            p_currency_code: CURRENCY_COP.to_string(),
            p_description: format!(
                "Pago de factura {} - {}",
                invoice.payment_reference, customer.name
            ),
            p_signature: signature.clone(),

            p_customer_document: customer.document.clone(),
            p_customer_document_type: DOCUMENT_TYPE_CEDULA.to_string(),
            p_customer_name: customer.name.clone(),
            p_customer_email: customer
                .email
                .clone()
                .unwrap_or_else(|| FALLBACK_CUSTOMER_EMAIL.to_string()),
            p_customer_phone: customer.phone.clone(),

            p_reference_payco: invoice.payment_reference.clone(),
            p_extra1: invoice.id.to_string(),
            p_extra2: "BigPagos".to_string(),
            p_extra3: "Internet Service".to_string(),

            p_url_response: format!("{}/api/webhook/pse/response", self.public_base_url),
            p_url_confirmation: format!("{}/api/webhook/pse/confirmation", self.public_base_url),

            p_payment_method: "pse".to_string(),
            p_bank_code: self.default_bank_code.clone(),
            p_pse_bank: self.default_bank_code.clone(),
        };

        let data = self.gateway.create_payment(&request).await?;

        tracing::info!(
            invoice_id = invoice.id,
            transaction_id = %data.transaction_id,
            reference = %invoice.payment_reference,
            "Payment intent accepted by gateway"
        );

        Ok(PaymentIntent {
            invoice_id: invoice.id,
            amount: invoice.amount,
            payment_reference: invoice.payment_reference.clone(),
            signature,
            transaction_id: data.transaction_id,
            redirect_url: data.url,
        })
    }
}
