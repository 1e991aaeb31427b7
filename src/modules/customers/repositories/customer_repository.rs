use async_trait::async_trait;
use sqlx::MySqlPool;

use super::super::models::{Customer, NewCustomer, UpdateCustomer};
use crate::core::{AppError, Result};

/// Customer persistence boundary
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, new: &NewCustomer) -> Result<Customer>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>>;

    async fn find_by_document(&self, document: &str) -> Result<Option<Customer>>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Customer>>;

    /// Every active customer, the billing population for a period
    async fn list_active(&self) -> Result<Vec<Customer>>;

    async fn update(&self, id: i64, changes: &UpdateCustomer) -> Result<Customer>;

    async fn deactivate(&self, id: i64) -> Result<()>;
}

/// MySQL-backed customer repository
pub struct MySqlCustomerRepository {
    pool: MySqlPool,
}

impl MySqlCustomerRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for MySqlCustomerRepository {
    async fn create(&self, new: &NewCustomer) -> Result<Customer> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (document, name, email, phone, address)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.document)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                AppError::Conflict(format!(
                    "Customer with document '{}' already exists",
                    new.document
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        let id = result.last_insert_id() as i64;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Customer was created but not found"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, document, name, email, phone, address, is_active, created_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, document, name, email, phone, address, is_active, created_at
            FROM customers
            WHERE document = ?
            "#,
        )
        .bind(document)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, document, name, email, phone, address, is_active, created_at
            FROM customers
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn list_active(&self) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, document, name, email, phone, address, is_active, created_at
            FROM customers
            WHERE is_active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn update(&self, id: i64, changes: &UpdateCustomer) -> Result<Customer> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;

        sqlx::query(
            r#"
            UPDATE customers
            SET name = ?, email = ?, phone = ?, address = ?
            WHERE id = ?
            "#,
        )
        .bind(changes.name.as_ref().unwrap_or(&existing.name))
        .bind(changes.email.as_ref().or(existing.email.as_ref()))
        .bind(changes.phone.as_ref().unwrap_or(&existing.phone))
        .bind(changes.address.as_ref().or(existing.address.as_ref()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Customer disappeared during update"))
    }

    async fn deactivate(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE customers SET is_active = FALSE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Customer {} not found", id)));
        }

        Ok(())
    }
}
