use std::sync::Arc;

use jsonwebtoken::{encode, Header};

use super::super::models::TokenResponse;
use super::super::repositories::UserRepository;
use crate::core::{AppError, Result};
use crate::middleware::auth::{verify_password, Claims, JwtKeys};

/// Operator login, issuing JWT session tokens
pub struct AuthService {
    users: Arc<UserRepository>,
    keys: JwtKeys,
    expires_in_secs: i64,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>, keys: JwtKeys, expires_in_secs: i64) -> Self {
        Self {
            users,
            keys,
            expires_in_secs,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(username, "Failed login attempt");
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now,
            exp: now + self.expires_in_secs,
        };

        let token = encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| AppError::internal(format!("Failed to issue token: {}", e)))?;

        tracing::info!(user_id = user.id, "Operator logged in");

        Ok(TokenResponse {
            token,
            expires_in: self.expires_in_secs,
        })
    }
}
