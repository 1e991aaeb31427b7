use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bigpagos::core::{AppError, Result};
use bigpagos::invoices::{Invoice, InvoiceRepository, InvoiceStatus, NewInvoice};
use bigpagos::payments::{
    NewPayment, Payment, PaymentRepository, PaymentStats, TransactionStatus,
};
use bigpagos::pse::{PseWebhookEvent, ReconciliationEngine, SignatureCodec};

const CLIENT_ID: &str = "client-123";
const CLIENT_SECRET: &str = "s3cret";

// ---------------------------------------------------------------------------
// In-memory storage fakes

struct InMemoryInvoices {
    rows: Mutex<HashMap<i64, Invoice>>,
}

impl InMemoryInvoices {
    fn with(invoices: Vec<Invoice>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(invoices.into_iter().map(|i| (i.id, i)).collect()),
        })
    }

    fn status_of(&self, id: i64) -> InvoiceStatus {
        self.rows.lock().unwrap()[&id].status
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoices {
    async fn create(&self, new: &NewInvoice) -> Result<Invoice> {
        let mut rows = self.rows.lock().unwrap();
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

    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut moved = 0;
        for invoice in rows.values_mut() {
            if invoice.status == InvoiceStatus::Pending && invoice.due_date < today {
                invoice.status = InvoiceStatus::Overdue;
                moved += 1;
            }
        }
        Ok(moved)
    }
}

struct InMemoryPayments {
    rows: Mutex<Vec<Payment>>,
    next_id: AtomicI64,
}

impl InMemoryPayments {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        })
    }

    fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPayments {
    /// Mirrors the unique index on `transaction_code`: a second insert
    /// for the same code hands back the existing row.
    async fn insert(&self, new: &NewPayment) -> Result<Payment> {
        let mut rows = self.rows.lock().unwrap();

        if let Some(code) = &new.transaction_code {
            if let Some(existing) = rows
                .iter()
                .find(|p| p.transaction_code.as_deref() == Some(code))
            {
                return Ok(existing.clone());
            }
        }

        let payment = Payment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            invoice_id: new.invoice_id,
            amount_paid: new.amount_paid,
            method: new.method,
            status: new.status,
            transaction_code: new.transaction_code.clone(),
            paid_at: Some(Utc::now()),
        };
        rows.push(payment.clone());
        Ok(payment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_transaction_code(&self, code: &str) -> Result<Option<Payment>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.transaction_code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_by_invoice(&self, invoice_id: i64) -> Result<Vec<Payment>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn update_reconciliation(
        &self,
        id: i64,
        status: TransactionStatus,
        code: &str,
    ) -> Result<Payment> {
        let mut rows = self.rows.lock().unwrap();
        let payment = rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found(format!("Payment {} not found", id)))?;
        payment.status = status;
        if payment.transaction_code.is_none() {
            payment.transaction_code = Some(code.to_string());
        }
        Ok(payment.clone())
    }

    async fn count_approved_for_invoice(&self, invoice_id: i64) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.invoice_id == invoice_id && p.status == TransactionStatus::Approved)
            .count() as i64)
    }

    async fn stats(&self) -> Result<PaymentStats> {
        let rows = self.rows.lock().unwrap();
        let total = |status| {
            rows.iter()
                .filter(|p| p.status == status)
                .map(|p| p.amount_paid)
                .sum::<Decimal>()
        };
        let count =
            |status| rows.iter().filter(|p| p.status == status).count() as i64;
        Ok(PaymentStats {
            total_count: rows.len() as i64,
            approved_count: count(TransactionStatus::Approved),
            rejected_count: count(TransactionStatus::Rejected),
            pending_count: count(TransactionStatus::Pending),
            approved_total: total(TransactionStatus::Approved),
            rejected_total: total(TransactionStatus::Rejected),
            pending_total: total(TransactionStatus::Pending),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures

fn invoice(id: i64, amount: Decimal) -> Invoice {
    Invoice {
        id,
        customer_id: 1,
        period: "2024-06".to_string(),
        amount,
        due_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        payment_reference: format!("BP0001{:04}0001", id),
        status: InvoiceStatus::Pending,
        created_at: Some(Utc::now()),
    }
}

fn signed_event(transaction_id: &str, response_code: &str, amount: &str, extra1: &str) -> PseWebhookEvent {
    let codec = SignatureCodec::new(CLIENT_ID, CLIENT_SECRET);
    PseWebhookEvent {
        x_transaction_id: transaction_id.to_string(),
        x_response_code: response_code.to_string(),
        x_amount: amount.to_string(),
        x_currency_code: "COP".to_string(),
        x_extra1: extra1.to_string(),
        x_reference_payco: None,
        // the webhook digest carries the transaction id in the same
        // slot an outbound signature carries the reference
        x_signature: codec.sign(amount, transaction_id),
    }
}

struct Harness {
    engine: Arc<ReconciliationEngine>,
    invoices: Arc<InMemoryInvoices>,
    payments: Arc<InMemoryPayments>,
}

fn harness(seed: Vec<Invoice>) -> Harness {
    let invoices = InMemoryInvoices::with(seed);
    let payments = InMemoryPayments::empty();
    let engine = Arc::new(ReconciliationEngine::new(
        SignatureCodec::new(CLIENT_ID, CLIENT_SECRET),
        invoices.clone(),
        payments.clone(),
    ));
    Harness {
        engine,
        invoices,
        payments,
    }
}

// ---------------------------------------------------------------------------
// Scenarios

#[tokio::test]
async fn approved_webhook_creates_payment_and_settles_invoice() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let event = signed_event("T1", "1", "50000", "42");

    let result = h.engine.reconcile(&event).await.unwrap();

    assert!(!result.duplicate);
    assert_eq!(result.payment.status, TransactionStatus::Approved);
    assert_eq!(result.payment.invoice_id, 42);
    assert_eq!(result.payment.amount_paid, dec!(50000));
    assert_eq!(result.payment.transaction_code.as_deref(), Some("T1"));
    assert_eq!(result.invoice_status, InvoiceStatus::Paid);
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Paid);
}

#[tokio::test]
async fn replayed_delivery_is_an_observable_noop() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let event = signed_event("T1", "1", "50000", "42");

    let first = h.engine.reconcile(&event).await.unwrap();
    let second = h.engine.reconcile(&event).await.unwrap();

    assert!(!first.duplicate);
    assert!(second.duplicate);
    assert_eq!(second.payment.id, first.payment.id);
    assert_eq!(h.payments.count(), 1);
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Paid);
}

#[tokio::test]
async fn tampered_signature_is_rejected_before_any_write() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let mut event = signed_event("T1", "1", "50000", "42");
    event.x_signature = format!("0{}", &event.x_signature[1..]);

    let error = h.engine.reconcile(&event).await.unwrap_err();

    assert!(matches!(error, AppError::InvalidSignature));
    assert_eq!(h.payments.count(), 0);
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Pending);
}

#[tokio::test]
async fn signature_covers_the_amount() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let mut event = signed_event("T1", "1", "50000", "42");
    event.x_amount = "1".to_string();

    assert!(matches!(
        h.engine.reconcile(&event).await.unwrap_err(),
        AppError::InvalidSignature
    ));
}

#[tokio::test]
async fn rejection_of_unrelated_payment_keeps_invoice_paid() {
    let h = harness(vec![invoice(42, dec!(50000))]);

    h.engine
        .reconcile(&signed_event("T1", "1", "50000", "42"))
        .await
        .unwrap();
    let result = h
        .engine
        .reconcile(&signed_event("T2", "4", "50000", "42"))
        .await
        .unwrap();

    assert_eq!(result.payment.status, TransactionStatus::Rejected);
    assert_eq!(h.payments.count(), 2);
    // the approved payment still settles the invoice
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Paid);
}

#[tokio::test]
async fn rejection_of_the_settling_payment_reverts_the_invoice() {
    let h = harness(vec![invoice(42, dec!(50000))]);

    h.engine
        .reconcile(&signed_event("T1", "1", "50000", "42"))
        .await
        .unwrap();
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Paid);

    let result = h
        .engine
        .reconcile(&signed_event("T1", "2", "50000", "42"))
        .await
        .unwrap();

    assert!(!result.duplicate);
    assert_eq!(result.payment.status, TransactionStatus::Rejected);
    assert_eq!(h.payments.count(), 1);
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Pending);
}

#[tokio::test]
async fn pending_status_never_touches_the_invoice() {
    let h = harness(vec![invoice(42, dec!(50000))]);

    for code in ["3", "99"] {
        let result = h
            .engine
            .reconcile(&signed_event(&format!("T-{}", code), code, "50000", "42"))
            .await
            .unwrap();

        assert_eq!(result.payment.status, TransactionStatus::Pending);
        assert_eq!(h.invoices.status_of(42), InvoiceStatus::Pending);
    }
}

#[tokio::test]
async fn pending_then_approved_settles_through_the_same_payment_row() {
    let h = harness(vec![invoice(42, dec!(50000))]);

    let pending = h
        .engine
        .reconcile(&signed_event("T1", "3", "50000", "42"))
        .await
        .unwrap();
    let approved = h
        .engine
        .reconcile(&signed_event("T1", "1", "50000", "42"))
        .await
        .unwrap();

    assert_eq!(approved.payment.id, pending.payment.id);
    assert_eq!(approved.payment.status, TransactionStatus::Approved);
    assert_eq!(h.payments.count(), 1);
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Paid);
}

#[tokio::test]
async fn non_numeric_correlation_field_is_rejected_without_writes() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let event = signed_event("T1", "1", "50000", "abc");

    let error = h.engine.reconcile(&event).await.unwrap_err();

    assert!(matches!(error, AppError::MalformedEvent(_)));
    assert_eq!(h.payments.count(), 0);
}

#[tokio::test]
async fn unknown_invoice_is_fatal_for_the_event() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let event = signed_event("T1", "1", "50000", "999");

    let error = h.engine.reconcile(&event).await.unwrap_err();

    assert!(matches!(error, AppError::NotFound(_)));
    assert_eq!(h.payments.count(), 0);
}

#[tokio::test]
async fn concurrent_deliveries_for_one_code_produce_one_payment() {
    let h = harness(vec![invoice(42, dec!(50000))]);
    let event = signed_event("T1", "1", "50000", "42");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = h.engine.clone();
            let event = event.clone();
            tokio::spawn(async move { engine.reconcile(&event).await })
        })
        .collect();

    let mut fresh = 0;
    for task in tasks {
        let result = task.await.unwrap().unwrap();
        if !result.duplicate {
            fresh += 1;
        }
    }

    assert_eq!(fresh, 1);
    assert_eq!(h.payments.count(), 1);
    assert_eq!(h.invoices.status_of(42), InvoiceStatus::Paid);
    assert_eq!(h.engine.active_lock_count().await, 0);
}

#[tokio::test]
async fn per_code_locks_are_released_after_each_delivery() {
    let h = harness(vec![invoice(42, dec!(50000))]);

    for i in 0..200 {
        h.engine
            .reconcile(&signed_event(&format!("T-{}", i), "3", "50000", "42"))
            .await
            .unwrap();
    }

    assert_eq!(h.payments.count(), 200);
    assert_eq!(h.engine.active_lock_count().await, 0);
}

#[tokio::test]
async fn per_code_locks_are_released_on_failed_deliveries() {
    let h = harness(vec![invoice(42, dec!(50000))]);

    // fails inside the locked section
    h.engine
        .reconcile(&signed_event("T1", "1", "50000", "999"))
        .await
        .unwrap_err();

    assert_eq!(h.engine.active_lock_count().await, 0);
}
