use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;

use super::super::models::{payment_reference, Invoice, InvoiceStatus, NewInvoice};
use crate::core::{AppError, Result};

/// Invoice persistence boundary
///
/// The reconciliation engine holds this as a trait object so it can be
/// exercised against in-memory storage in tests.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, new: &NewInvoice) -> Result<Invoice>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>>;

    async fn find_by_customer(&self, customer_id: i64) -> Result<Vec<Invoice>>;

    async fn find_by_customer_and_period(
        &self,
        customer_id: i64,
        period: &str,
    ) -> Result<Option<Invoice>>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Invoice>>;

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<()>;

    /// Move every pending invoice past its due date to overdue.
    /// Returns the number of invoices transitioned.
    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64>;
}

/// MySQL-backed invoice repository
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, customer_id, period, amount, due_date, payment_reference, status, created_at";

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    /// Two-phase creation inside a single database transaction: the
    /// payment reference embeds the generated invoice id, so the row is
    /// inserted first and its reference written before commit. No other
    /// connection can observe the placeholder reference.
    async fn create(&self, new: &NewInvoice) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (customer_id, period, amount, due_date, payment_reference, status)
            VALUES (?, ?, ?, ?, '', 'pending')
            "#,
        )
        .bind(new.customer_id)
        .bind(&new.period)
        .bind(new.amount)
        .bind(new.due_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                AppError::Conflict(format!(
                    "Invoice for customer {} in period '{}' already exists",
                    new.customer_id, new.period
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        let id = result.last_insert_id() as i64;
        let reference = payment_reference(new.customer_id, id, Utc::now().timestamp_millis());

        sqlx::query("UPDATE invoices SET payment_reference = ? WHERE id = ?")
            .bind(&reference)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(invoice)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn find_by_customer(&self, customer_id: i64) -> Result<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE customer_id = ? ORDER BY period DESC",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn find_by_customer_and_period(
        &self,
        customer_id: i64,
        period: &str,
    ) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE customer_id = ? AND period = ?",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices ORDER BY id DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<()> {
        let result = sqlx::query("UPDATE invoices SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Invoice {} not found", id)));
        }

        Ok(())
    }

    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'overdue'
            WHERE status = 'pending' AND due_date < ?
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
