use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use bigpagos::core::{AppError, Result};
use bigpagos::customers::{
    Customer, CustomerRepository, CustomerService, NewCustomer, UpdateCustomer,
};
use bigpagos::invoices::{Invoice, InvoiceRepository, InvoiceService, InvoiceStatus, NewInvoice};

// ---------------------------------------------------------------------------
// In-memory storage fakes

struct InMemoryCustomers {
    rows: Mutex<Vec<Customer>>,
}

impl InMemoryCustomers {
    fn with(customers: Vec<Customer>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(customers),
        })
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomers {
    async fn create(&self, new: &NewCustomer) -> Result<Customer> {
        let mut rows = self.rows.lock().unwrap();
        let customer = Customer {
            id: rows.iter().map(|c| c.id).max().unwrap_or(0) + 1,
            document: new.document.clone(),
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            address: new.address.clone(),
            is_active: true,
            created_at: Some(Utc::now()),
        };
        rows.push(customer.clone());
        Ok(customer)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Customer>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.document == document)
            .cloned())
    }

    async fn list(&self, _limit: i64, _offset: i64) -> Result<Vec<Customer>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn list_active(&self) -> Result<Vec<Customer>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, changes: &UpdateCustomer) -> Result<Customer> {
        let mut rows = self.rows.lock().unwrap();
        let customer = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;
        if let Some(name) = &changes.name {
            customer.name = name.clone();
        }
        Ok(customer.clone())
    }

    async fn deactivate(&self, id: i64) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let customer = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;
        customer.is_active = false;
        Ok(())
    }
}

struct InMemoryInvoices {
    rows: Mutex<HashMap<i64, Invoice>>,
}

impl InMemoryInvoices {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(HashMap::new()),
        })
    }

    fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoices {
    async fn create(&self, new: &NewInvoice) -> Result<Invoice> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|i| i.customer_id == new.customer_id && i.period == new.period)
        {
            return Err(AppError::Conflict(format!(
                "Invoice for customer {} in period '{}' already exists",
                new.customer_id, new.period
            )));
        }
        let id = rows.keys().max().copied().unwrap_or(0) + 1;
        let invoice = Invoice {
            id,
            customer_id: new.customer_id,
            period: new.period.clone(),
            amount: new.amount,
            due_date: new.due_date,
            payment_reference: format!("BP{:04}{:04}000000", new.customer_id, id),
            status: InvoiceStatus::Pending,
            created_at: Some(Utc::now()),
        };
        rows.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_customer(&self, customer_id: i64) -> Result<Vec<Invoice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn find_by_customer_and_period(
        &self,
        customer_id: i64,
        period: &str,
    ) -> Result<Option<Invoice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|i| i.customer_id == customer_id && i.period == period)
            .cloned())
    }

    async fn list(&self, _limit: i64, _offset: i64) -> Result<Vec<Invoice>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let invoice = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", id)))?;
        invoice.status = status;
        Ok(())
    }

    async fn mark_overdue(&self, _today: NaiveDate) -> Result<u64> {
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// Fixtures

fn customer(id: i64, document: &str, is_active: bool) -> Customer {
    Customer {
        id,
        document: document.to_string(),
        name: format!("Customer {}", id),
        email: None,
        phone: "3000000000".to_string(),
        address: None,
        is_active,
        created_at: Some(Utc::now()),
    }
}

fn service(customers: Arc<InMemoryCustomers>, invoices: Arc<InMemoryInvoices>) -> InvoiceService {
    InvoiceService::new(invoices, customers)
}

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

// ---------------------------------------------------------------------------
// Bulk generation

#[tokio::test]
async fn generates_one_invoice_per_active_customer() {
    let customers = InMemoryCustomers::with(vec![
        customer(1, "100", true),
        customer(2, "200", true),
        customer(3, "300", false),
    ]);
    let invoices = InMemoryInvoices::empty();

    let report = service(customers, invoices.clone())
        .generate_for_period("2024-06", due(), dec!(50000))
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.total_customers, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(invoices.count(), 2);
}

#[tokio::test]
async fn skips_customers_already_invoiced_for_the_period() {
    let customers = InMemoryCustomers::with(vec![
        customer(1, "100", true),
        customer(2, "200", true),
    ]);
    let invoices = InMemoryInvoices::empty();
    invoices
        .create(&NewInvoice {
            customer_id: 1,
            period: "2024-06".to_string(),
            amount: dec!(50000),
            due_date: due(),
        })
        .await
        .unwrap();

    let report = service(customers, invoices.clone())
        .generate_for_period("2024-06", due(), dec!(50000))
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].contains("100"));
    assert_eq!(invoices.count(), 2);
}

#[tokio::test]
async fn rerun_is_a_noop_for_the_same_period() {
    let customers = InMemoryCustomers::with(vec![
        customer(1, "100", true),
        customer(2, "200", true),
    ]);
    let invoices = InMemoryInvoices::empty();
    let service = service(customers, invoices.clone());

    service
        .generate_for_period("2024-06", due(), dec!(50000))
        .await
        .unwrap();
    let rerun = service
        .generate_for_period("2024-06", due(), dec!(50000))
        .await
        .unwrap();

    assert_eq!(rerun.created, 0);
    assert_eq!(rerun.skipped.len(), 2);
    assert_eq!(invoices.count(), 2);
}

#[tokio::test]
async fn fails_without_active_customers() {
    let customers = InMemoryCustomers::with(vec![customer(1, "100", false)]);
    let invoices = InMemoryInvoices::empty();

    let error = service(customers, invoices.clone())
        .generate_for_period("2024-06", due(), dec!(50000))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::Validation(_)));
    assert_eq!(invoices.count(), 0);
}

#[tokio::test]
async fn rejects_invalid_period_before_any_write() {
    let customers = InMemoryCustomers::with(vec![customer(1, "100", true)]);
    let invoices = InMemoryInvoices::empty();

    let error = service(customers, invoices.clone())
        .generate_for_period("2024-13", due(), dec!(50000))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::Validation(_)));
    assert_eq!(invoices.count(), 0);
}

// ---------------------------------------------------------------------------
// Customer lookup by document

#[tokio::test]
async fn finds_customer_by_document() {
    let customers = InMemoryCustomers::with(vec![customer(1, "1098765432", true)]);
    let service = CustomerService::new(customers);

    let found = service.find_by_document("1098765432").await.unwrap();
    assert_eq!(found.id, 1);

    let error = service.find_by_document("0000000000").await.unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}
