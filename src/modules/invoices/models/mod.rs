mod invoice;

pub use invoice::{payment_reference, BulkGenerationReport, Invoice, InvoiceStatus, NewInvoice};
