//! Order aggregate and related types.

mod aggregate;
mod service;

pub use aggregate::{OrderAggregate, OrderChanges};
pub use service::OrderService;

use common::{Money, OrderStatus, ProductId};
use thiserror::Error;

/// Errors raised by order business rules.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in a state that allows the operation.
    #[error("Invalid operation: cannot {action} a {current_status} order")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i32 },

    /// The product cannot be sold.
    #[error("Product {product_id} is inactive")]
    ProductInactive { product_id: ProductId },

    /// Discounts cannot be negative.
    #[error("Invalid discount: {discount}")]
    InvalidDiscount { discount: Money },
}
