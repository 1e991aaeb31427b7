use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
///
/// Webhook processing dispatches on these variants, never on message
/// content: signature and correlation failures must be distinguishable
/// from transient gateway or storage failures at the boundary.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Webhook authenticity check failed; no state was mutated
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook carried a missing or unparseable required field
    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),

    /// Payment intent requested for an invoice that is already settled
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(i64),

    /// Transport failure or non-success response from the PSE gateway
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors for business rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflicting state, e.g. duplicate invoice for a billing period
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyPaid(_) => StatusCode::CONFLICT,
            AppError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        AppError::MalformedEvent(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::GatewayUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
