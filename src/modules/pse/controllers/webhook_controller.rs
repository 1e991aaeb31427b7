use std::sync::Arc;

use actix_web::web::{self, Either, Form, Json};
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::super::models::PseWebhookEvent;
use super::super::services::{PaymentIntentBuilder, PseGateway, ReconciliationEngine};
use crate::core::AppError;
use crate::modules::customers::CustomerRepository;
use crate::modules::invoices::{InvoiceRepository, InvoiceStatus};
use crate::modules::payments::{Payment, TransactionStatus};

/// PSE webhook and payment-intent endpoints
///
/// Two inbound webhook routes share one processing contract: the
/// user-redirect response route reports failures to its caller, while
/// the server-to-server confirmation route acknowledges authenticated
/// events with 200 even when internal processing fails, so the gateway
/// does not redeliver indefinitely.
pub struct WebhookController {
    engine: Arc<ReconciliationEngine>,
    intent_builder: Arc<PaymentIntentBuilder>,
    gateway: Arc<dyn PseGateway>,
    invoices: Arc<dyn InvoiceRepository>,
    customers: Arc<dyn CustomerRepository>,
}

impl WebhookController {
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        intent_builder: Arc<PaymentIntentBuilder>,
        gateway: Arc<dyn PseGateway>,
        invoices: Arc<dyn InvoiceRepository>,
        customers: Arc<dyn CustomerRepository>,
    ) -> Self {
        Self {
            engine,
            intent_builder,
            gateway,
            invoices,
            customers,
        }
    }

    /// Configure webhook routes
    pub fn configure(cfg: &mut web::ServiceConfig, controller: WebhookController) {
        cfg.service(
            web::scope("/webhook/pse")
                .app_data(web::Data::new(controller))
                .route("/response", web::post().to(pse_response))
                .route("/confirmation", web::post().to(pse_confirmation))
                .route("/create-payment", web::post().to(create_payment_intent))
                .route("/banks", web::get().to(get_banks))
                .route("/verify/{transaction_id}", web::get().to(verify_transaction)),
        );
    }
}

/// The gateway posts webhooks as urlencoded forms in production and
/// JSON from its sandbox; accept both.
type WebhookBody = Either<Json<PseWebhookEvent>, Form<PseWebhookEvent>>;

fn into_event(body: WebhookBody) -> PseWebhookEvent {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

/// Reconciliation outcome reported to webhook callers
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub payment_id: i64,
    pub transaction_id: Option<String>,
    pub transaction_status: TransactionStatus,
    pub invoice_status: InvoiceStatus,
    pub duplicate: bool,
}

impl WebhookResponse {
    fn from_reconciliation(payment: &Payment, invoice_status: InvoiceStatus, duplicate: bool) -> Self {
        Self {
            success: true,
            payment_id: payment.id,
            transaction_id: payment.transaction_code.clone(),
            transaction_status: payment.status,
            invoice_status,
            duplicate,
        }
    }
}

/// POST /api/webhook/pse/response
///
/// User-redirect callback after checkout; returns the full
/// reconciliation outcome and surfaces failures.
pub async fn pse_response(
    controller: web::Data<WebhookController>,
    body: WebhookBody,
) -> Result<HttpResponse, AppError> {
    let event = into_event(body);
    let result = controller.engine.reconcile(&event).await?;

    Ok(HttpResponse::Ok().json(WebhookResponse::from_reconciliation(
        &result.payment,
        result.invoice_status,
        result.duplicate,
    )))
}

/// POST /api/webhook/pse/confirmation
///
/// Server-to-server confirmation. Unauthenticated or malformed events
/// are rejected so the gateway can tell its delivery was invalid; once
/// the signature has verified, internal failures are logged and the
/// event is still acknowledged with 200.
pub async fn pse_confirmation(
    controller: web::Data<WebhookController>,
    body: WebhookBody,
) -> Result<HttpResponse, AppError> {
    let event = into_event(body);

    match controller.engine.reconcile(&event).await {
        Ok(result) => {
            info!(
                payment_id = result.payment.id,
                invoice_status = %result.invoice_status,
                duplicate = result.duplicate,
                "Confirmation webhook reconciled"
            );
            Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
        }
        Err(e @ (AppError::InvalidSignature | AppError::MalformedEvent(_))) => Err(e),
        Err(e) => {
            error!(
                transaction_id = %event.x_transaction_id,
                error = %e,
                "Confirmation webhook failed after authentication; acknowledging to stop redelivery"
            );
            Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
        }
    }
}

/// Request body for creating a payment intent
#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub invoice_id: i64,
}

/// POST /api/webhook/pse/create-payment
pub async fn create_payment_intent(
    controller: web::Data<WebhookController>,
    request: Json<CreatePaymentIntentRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice_id = request.invoice_id;

    let invoice = controller
        .invoices
        .find_by_id(invoice_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", invoice_id)))?;

    let customer = controller
        .customers
        .find_by_id(invoice.customer_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Customer {} not found", invoice.customer_id))
        })?;

    let intent = controller.intent_builder.build(&invoice, &customer).await?;

    Ok(HttpResponse::Ok().json(intent))
}

/// GET /api/webhook/pse/banks
pub async fn get_banks(
    controller: web::Data<WebhookController>,
) -> Result<HttpResponse, AppError> {
    let banks = controller.gateway.list_banks().await?;
    Ok(HttpResponse::Ok().json(banks))
}

/// GET /api/webhook/pse/verify/{transaction_id}
pub async fn verify_transaction(
    controller: web::Data<WebhookController>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let transaction = controller
        .gateway
        .get_transaction(&path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(transaction))
}
