// Invoices module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{BulkGenerationReport, Invoice, InvoiceStatus, NewInvoice};
pub use repositories::{InvoiceRepository, MySqlInvoiceRepository};
pub use services::InvoiceService;
