use std::sync::Arc;

use actix_web::{web, HttpResponse};

use super::super::models::LoginRequest;
use super::super::services::AuthService;
use crate::core::AppError;

/// POST /api/auth/login
pub async fn login(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let token = service
        .login(&request.username, &request.password)
        .await?;
    Ok(HttpResponse::Ok().json(token))
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").route("/login", web::post().to(login)));
}
