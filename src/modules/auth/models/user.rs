use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An operator account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,

    pub username: String,

    /// Argon2 hash; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued session token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
}
