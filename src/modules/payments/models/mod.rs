mod payment;

pub use payment::{NewPayment, Payment, PaymentMethod, PaymentStats, TransactionStatus};
