mod customer;

pub use customer::{Customer, NewCustomer, UpdateCustomer};
