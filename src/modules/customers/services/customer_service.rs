use std::sync::Arc;

use super::super::models::{Customer, NewCustomer, UpdateCustomer};
use super::super::repositories::CustomerRepository;
use crate::core::{AppError, Result};

/// Customer management service
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn create_customer(&self, new: NewCustomer) -> Result<Customer> {
        new.validate()?;
        let customer = self.customers.create(&new).await?;

        tracing::info!(customer_id = customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: i64) -> Result<Customer> {
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))
    }

    pub async fn find_by_document(&self, document: &str) -> Result<Customer> {
        self.customers
            .find_by_document(document)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Customer with document '{}' not found", document))
            })
    }

    pub async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<Customer>> {
        self.customers.list(limit, offset).await
    }

    pub async fn update_customer(&self, id: i64, changes: UpdateCustomer) -> Result<Customer> {
        self.customers.update(id, &changes).await
    }

    pub async fn deactivate_customer(&self, id: i64) -> Result<()> {
        self.customers.deactivate(id).await?;
        tracing::info!(customer_id = id, "Customer deactivated");
        Ok(())
    }
}
