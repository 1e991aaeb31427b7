use std::sync::Arc;

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::super::models::{PaymentMethod, TransactionStatus};
use super::super::services::PaymentService;
use crate::core::AppError;
use crate::middleware::auth::AuthenticatedUser;

/// Request body for recording a manual payment
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub invoice_id: i64,
    pub amount_paid: Decimal,
    pub method: PaymentMethod,
    #[serde(default = "default_status")]
    pub status: TransactionStatus,
}

fn default_status() -> TransactionStatus {
    TransactionStatus::Approved
}

/// POST /api/payments
pub async fn record_payment(
    service: web::Data<Arc<PaymentService>>,
    _user: AuthenticatedUser,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let payment = service
        .record_manual_payment(
            request.invoice_id,
            request.amount_paid,
            request.method,
            request.status,
        )
        .await?;

    Ok(HttpResponse::Created().json(payment))
}

/// GET /api/payments/{id}
pub async fn get_payment(
    service: web::Data<Arc<PaymentService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let payment = service.get_payment(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

/// GET /api/payments/invoice/{invoice_id}
pub async fn list_invoice_payments(
    service: web::Data<Arc<PaymentService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let payments = service.list_invoice_payments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

/// GET /api/payments/stats
pub async fn payment_stats(
    service: web::Data<Arc<PaymentService>>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let stats = service.payment_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::post().to(record_payment))
            .route("/stats", web::get().to(payment_stats))
            .route("/{id}", web::get().to(get_payment))
            .route("/invoice/{invoice_id}", web::get().to(list_invoice_payments)),
    );
}
