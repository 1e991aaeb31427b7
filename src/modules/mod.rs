pub mod auth;
pub mod customers;
pub mod invoices;
pub mod payments;
pub mod pse;
