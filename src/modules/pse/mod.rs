// PSE gateway reconciliation module
//
// Outbound flow: invoice -> PaymentIntentBuilder -> SignatureCodec -> gateway.
// Inbound flow: webhook -> SignatureCodec -> ReconciliationEngine -> storage.

pub mod controllers;
pub mod models;
pub mod services;

pub use models::{Bank, PaymentIntent, PseWebhookEvent};
pub use services::{
    map_response_code, EpaycoClient, PaymentIntentBuilder, PseGateway, ReconciliationEngine,
    ReconciliationResult, SignatureCodec,
};
