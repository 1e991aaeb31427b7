use async_trait::async_trait;
use sqlx::MySqlPool;

use super::super::models::{NewPayment, Payment, PaymentStats, TransactionStatus};
use crate::core::{AppError, Result};

/// Payment persistence boundary
///
/// The unique index on `transaction_code` is what ultimately guarantees
/// "one payment row per external transaction code"; `insert` resolves a
/// duplicate-key conflict by returning the row that won the race.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, new: &NewPayment) -> Result<Payment>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>>;

    async fn find_by_transaction_code(&self, code: &str) -> Result<Option<Payment>>;

    async fn find_by_invoice(&self, invoice_id: i64) -> Result<Vec<Payment>>;

    /// Update a payment's status and backfill its transaction code
    async fn update_reconciliation(
        &self,
        id: i64,
        status: TransactionStatus,
        code: &str,
    ) -> Result<Payment>;

    async fn count_approved_for_invoice(&self, invoice_id: i64) -> Result<i64>;

    async fn stats(&self) -> Result<PaymentStats>;
}

/// MySQL-backed payment repository
pub struct MySqlPaymentRepository {
    pool: MySqlPool,
}

impl MySqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, invoice_id, amount_paid, method, status, transaction_code, paid_at";

#[async_trait]
impl PaymentRepository for MySqlPaymentRepository {
    async fn insert(&self, new: &NewPayment) -> Result<Payment> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (invoice_id, amount_paid, method, status, transaction_code)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.invoice_id)
        .bind(new.amount_paid)
        .bind(new.method)
        .bind(new.status)
        .bind(&new.transaction_code)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_id() as i64;
                self.find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::internal("Payment was created but not found"))
            }
            Err(e) => {
                let duplicate = e
                    .as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false);

                // A concurrent webhook for the same transaction code won
                // the insert; hand back its row so the caller takes the
                // update path.
                if duplicate {
                    if let Some(code) = &new.transaction_code {
                        if let Some(existing) = self.find_by_transaction_code(code).await? {
                            return Ok(existing);
                        }
                    }
                }

                Err(AppError::Database(e))
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn find_by_transaction_code(&self, code: &str) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE transaction_code = ?",
            SELECT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn find_by_invoice(&self, invoice_id: i64) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE invoice_id = ? ORDER BY paid_at DESC",
            SELECT_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn update_reconciliation(
        &self,
        id: i64,
        status: TransactionStatus,
        code: &str,
    ) -> Result<Payment> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, transaction_code = COALESCE(transaction_code, ?)
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(code)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Payment {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Payment disappeared during update"))
    }

    async fn count_approved_for_invoice(&self, invoice_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM payments
            WHERE invoice_id = ? AND status = 'approved'
            "#,
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn stats(&self) -> Result<PaymentStats> {
        // COUNT over a CASE keeps the count columns BIGINT; SUM over a
        // boolean comes back from MySQL as DECIMAL and does not decode
        // into i64.
        let row: (i64, i64, i64, i64, Option<rust_decimal::Decimal>, Option<rust_decimal::Decimal>, Option<rust_decimal::Decimal>) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(CASE WHEN status = 'approved' THEN 1 END),
                    COUNT(CASE WHEN status = 'rejected' THEN 1 END),
                    COUNT(CASE WHEN status = 'pending' THEN 1 END),
                    SUM(CASE WHEN status = 'approved' THEN amount_paid END),
                    SUM(CASE WHEN status = 'rejected' THEN amount_paid END),
                    SUM(CASE WHEN status = 'pending' THEN amount_paid END)
                FROM payments
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(PaymentStats {
            total_count: row.0,
            approved_count: row.1,
            rejected_count: row.2,
            pending_count: row.3,
            approved_total: row.4.unwrap_or_default(),
            rejected_total: row.5.unwrap_or_default(),
            pending_total: row.6.unwrap_or_default(),
        })
    }
}
