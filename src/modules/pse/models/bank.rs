use serde::{Deserialize, Serialize};

/// A bank available on the PSE rail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    #[serde(rename = "bankCode")]
    pub bank_code: String,

    #[serde(rename = "bankName")]
    pub bank_name: String,
}
