//! BigPagos recurring billing service
//!
//! Bills service customers monthly and reconciles PSE bank-transfer
//! gateway webhooks against invoices. The reconciliation engine in
//! `modules::pse` owns all webhook-driven state changes.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::customers;
pub use modules::invoices;
pub use modules::payments;
pub use modules::pse;
