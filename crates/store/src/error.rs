use thiserror::Error;
use uuid::Uuid;

use common::{OrderId, OrderStatus, ProductId, Version};

/// Errors that can occur when interacting with the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row exists for the given id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// An optimistic concurrency check failed when writing an order.
    /// Another writer updated the order since it was loaded.
    #[error("version conflict for order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The order left the pending status before the operation could run.
    #[error("order {order_id} is not pending (status: {status})")]
    OrderNotPending {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A payment is already recorded for this order.
    #[error("payment already recorded for order {order_id}")]
    DuplicatePayment { order_id: OrderId },

    /// Another product already carries this barcode.
    #[error("barcode already in use: {barcode}")]
    DuplicateBarcode { barcode: String },

    /// The product is referenced by order items and cannot be deleted.
    #[error("product {product_id} is referenced by existing order items")]
    ProductInUse { product_id: ProductId },

    /// A checkout under the reject stock policy would drive stock below zero.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
