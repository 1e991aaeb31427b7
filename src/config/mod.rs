use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
///
/// Gateway credentials live here and are injected into the signature
/// codec and gateway client at construction. No component reads the
/// environment after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub pse: PseGatewayConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// PSE payment gateway credentials and endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PseGatewayConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    /// Externally reachable base URL used to build the response and
    /// confirmation callback URLs embedded in outbound payment intents.
    pub public_base_url: String,
    pub default_bank_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            pse: PseGatewayConfig {
                client_id: env::var("PSE_CLIENT_ID")
                    .map_err(|_| AppError::Configuration("PSE_CLIENT_ID not set".to_string()))?,
                client_secret: env::var("PSE_CLIENT_SECRET").map_err(|_| {
                    AppError::Configuration("PSE_CLIENT_SECRET not set".to_string())
                })?,
                base_url: env::var("PSE_GATEWAY_URL")
                    .unwrap_or_else(|_| "https://sandbox.epayco.co".to_string()),
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                default_bank_code: env::var("PSE_DEFAULT_BANK_CODE")
                    .unwrap_or_else(|_| "1007".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| AppError::Configuration("JWT_SECRET not set".to_string()))?,
                jwt_expires_in_secs: env::var("JWT_EXPIRES_IN_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid JWT_EXPIRES_IN_SECS".to_string())
                    })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pse.client_id.trim().is_empty() || self.pse.client_secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "PSE gateway credentials must not be empty".to_string(),
            ));
        }

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "JWT secret must not be empty".to_string(),
            ));
        }

        if self.auth.jwt_expires_in_secs <= 0 {
            return Err(AppError::Configuration(
                "JWT expiry must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
