//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the backing store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A business rule rejected the operation.
    #[error("Order error: {0}")]
    Order(OrderError),
}
