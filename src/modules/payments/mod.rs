// Payments module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{NewPayment, Payment, PaymentMethod, PaymentStats, TransactionStatus};
pub use repositories::{MySqlPaymentRepository, PaymentRepository};
pub use services::PaymentService;
