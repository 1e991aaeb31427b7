use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// A recurring-service customer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,

    /// National identity document (cedula), unique per customer
    pub document: String,

    pub name: String,

    pub email: Option<String>,

    pub phone: String,

    pub address: Option<String>,

    pub is_active: bool,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a customer
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub document: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<()> {
        if self.document.trim().is_empty() {
            return Err(AppError::validation("Customer document cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Customer name cannot be empty"));
        }
        if self.phone.trim().is_empty() {
            return Err(AppError::validation("Customer phone cannot be empty"));
        }
        Ok(())
    }
}

/// Payload for updating a customer's contact details
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
