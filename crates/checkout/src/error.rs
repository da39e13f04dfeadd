//! Checkout error types.

use common::{OrderId, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Payment input failed validation.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: &'static str },

    /// The order has no items to check out.
    #[error("Order {order_id} has no items")]
    EmptyOrder { order_id: OrderId },

    /// The order is not pending, so it cannot be checked out (again).
    #[error("Order {order_id} is {status}, expected pending")]
    OrderNotPending {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
