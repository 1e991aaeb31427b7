use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::super::models::NewInvoice;
use super::super::services::InvoiceService;
use crate::core::AppError;
use crate::middleware::auth::AuthenticatedUser;

/// Query parameters for listing invoices
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /api/invoices
pub async fn create_invoice(
    service: web::Data<Arc<InvoiceService>>,
    _user: AuthenticatedUser,
    request: web::Json<NewInvoice>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.create_invoice(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(invoice))
}

/// Request body for bulk invoice generation
#[derive(Debug, Deserialize)]
pub struct GenerateInvoicesRequest {
    pub period: String,
    pub due_date: NaiveDate,
    /// Flat monthly amount; defaults to the standard service fee
    #[serde(default = "default_monthly_amount")]
    pub amount: Decimal,
}

fn default_monthly_amount() -> Decimal {
    Decimal::from(50_000)
}

/// POST /api/invoices/generate
pub async fn generate_invoices(
    service: web::Data<Arc<InvoiceService>>,
    _user: AuthenticatedUser,
    request: web::Json<GenerateInvoicesRequest>,
) -> Result<HttpResponse, AppError> {
    let report = service
        .generate_for_period(&request.period, request.due_date, request.amount)
        .await?;
    Ok(HttpResponse::Created().json(report))
}

/// GET /api/invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<InvoiceService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.get_invoice(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

/// GET /api/invoices
pub async fn list_invoices(
    service: web::Data<Arc<InvoiceService>>,
    _user: AuthenticatedUser,
    query: web::Query<ListInvoicesQuery>,
) -> Result<HttpResponse, AppError> {
    let invoices = service.list_invoices(query.limit, query.offset).await?;
    Ok(HttpResponse::Ok().json(invoices))
}

/// GET /api/invoices/customer/{customer_id}
pub async fn list_customer_invoices(
    service: web::Data<Arc<InvoiceService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let invoices = service.list_customer_invoices(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoices))
}

/// Configure invoice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .route("", web::post().to(create_invoice))
            .route("", web::get().to(list_invoices))
            .route("/generate", web::post().to(generate_invoices))
            .route("/{id}", web::get().to(get_invoice))
            .route("/customer/{customer_id}", web::get().to(list_customer_invoices)),
    );
}
