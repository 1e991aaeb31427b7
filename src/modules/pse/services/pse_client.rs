use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::super::models::Bank;
use crate::core::{AppError, Result};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport boundary to the PSE gateway's REST API
///
/// Every transport failure or non-success gateway response surfaces
/// uniformly as `GatewayUnavailable`. No retries at this layer.
#[async_trait]
pub trait PseGateway: Send + Sync {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<GatewayPaymentData>;

    async fn get_transaction(&self, transaction_id: &str) -> Result<serde_json::Value>;

    async fn list_banks(&self) -> Result<Vec<Bank>>;
}

/// Outbound payment-creation payload, in the gateway's wire format
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    pub p_cust_id_cliente: String,
    pub p_amount: String,
    pub p_currency_code: String,
    pub p_description: String,
    pub p_signature: String,

    pub p_customer_document: String,
    pub p_customer_document_type: String,
    pub p_customer_name: String,
    pub p_customer_email: String,
    pub p_customer_phone: String,

    pub p_reference_payco: String,
    /// Invoice id echoed back in webhook `x_extra1`
    pub p_extra1: String,
    pub p_extra2: String,
    pub p_extra3: String,

    pub p_url_response: String,
    pub p_url_confirmation: String,

    pub p_payment_method: String,
    pub p_bank_code: String,
    pub p_pse_bank: String,
}

/// Payment data inside a successful gateway response
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPaymentData {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub url: String,
}

/// Gateway response envelope: `{ success, message, data }`
#[derive(Debug, Deserialize)]
struct GatewayEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> GatewayEnvelope<T> {
    fn into_data(self, operation: &str) -> Result<T> {
        if !self.success {
            return Err(AppError::gateway(
                self.message
                    .unwrap_or_else(|| format!("{} rejected by gateway", operation)),
            ));
        }
        self.data
            .ok_or_else(|| AppError::gateway(format!("{} response carried no data", operation)))
    }
}

/// HTTP client for the ePayco PSE gateway
pub struct EpaycoClient {
    client: Client,
    base_url: String,
}

impl EpaycoClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn transport_error(operation: &str, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::gateway(format!("{}: gateway timed out", operation))
        } else if e.is_connect() {
            AppError::gateway(format!("{}: connection failed ({})", operation, e))
        } else {
            AppError::gateway(format!("{}: {}", operation, e))
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error(operation, e))?;

        if !status.is_success() {
            return Err(AppError::gateway(format!(
                "{}: gateway returned HTTP {} ({})",
                operation,
                status.as_u16(),
                body
            )));
        }

        serde_json::from_str::<GatewayEnvelope<T>>(&body)
            .map_err(|e| AppError::gateway(format!("{}: unreadable gateway response: {}", operation, e)))?
            .into_data(operation)
    }
}

#[async_trait]
impl PseGateway for EpaycoClient {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<GatewayPaymentData> {
        let url = format!("{}/v1/payment", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(GATEWAY_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::transport_error("create_payment", e))?;

        Self::decode("create_payment", response).await
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/v1/transaction/{}", self.base_url, transaction_id);

        let response = self
            .client
            .get(&url)
            .timeout(GATEWAY_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::transport_error("get_transaction", e))?;

        Self::decode("get_transaction", response).await
    }

    async fn list_banks(&self) -> Result<Vec<Bank>> {
        let url = format!("{}/v1/pse/banks", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(GATEWAY_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::transport_error("list_banks", e))?;

        Self::decode("list_banks", response).await
    }
}
