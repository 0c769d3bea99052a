//! Storage Layer
//!
//! In-memory document store with repository pattern for the storefront:
//! users (local and OAuth), the robot catalog and orders.

mod models;
mod repository;

pub use models::{
    AuthProvider, CustomerInfo, NewOrder, NewRobot, NewUser, OAuthProfile, Order, OrderItem,
    OrderStatus, PaymentMethod, PaymentStatus, Robot, User,
};
pub use repository::Repository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate key: {0} already exists")]
    Duplicate(String),
    #[error("{0}")]
    Validation(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Validation failure listing the missing fields of `entity`
    pub(crate) fn validation(entity: &str, missing: &[&str]) -> Self {
        Self::Validation(format!(
            "{} validation failed: {} required",
            entity,
            missing.join(", ")
        ))
    }
}
