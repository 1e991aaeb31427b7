use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::super::models::{NewCustomer, UpdateCustomer};
use super::super::services::CustomerService;
use crate::core::AppError;
use crate::middleware::auth::AuthenticatedUser;

/// Query parameters for listing customers
#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /api/customers
pub async fn create_customer(
    service: web::Data<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    request: web::Json<NewCustomer>,
) -> Result<HttpResponse, AppError> {
    let customer = service.create_customer(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(customer))
}

/// GET /api/customers/{id}
pub async fn get_customer(
    service: web::Data<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let customer = service.get_customer(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

/// GET /api/customers
pub async fn list_customers(
    service: web::Data<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    query: web::Query<ListCustomersQuery>,
) -> Result<HttpResponse, AppError> {
    let customers = service.list_customers(query.limit, query.offset).await?;
    Ok(HttpResponse::Ok().json(customers))
}

/// GET /api/customers/document/{document}
///
/// Lookup by national identity document, the key field agents have at
/// hand.
pub async fn get_customer_by_document(
    service: web::Data<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer = service.find_by_document(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

/// PUT /api/customers/{id}
pub async fn update_customer(
    service: web::Data<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateCustomer>,
) -> Result<HttpResponse, AppError> {
    let customer = service
        .update_customer(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(customer))
}

/// DELETE /api/customers/{id}
pub async fn deactivate_customer(
    service: web::Data<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    service.deactivate_customer(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure customer routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers")
            .route("", web::post().to(create_customer))
            .route("", web::get().to(list_customers))
            .route("/document/{document}", web::get().to(get_customer_by_document))
            .route("/{id}", web::get().to(get_customer))
            .route("/{id}", web::put().to(update_customer))
            .route("/{id}", web::delete().to(deactivate_customer)),
    );
}
