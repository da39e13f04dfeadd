//! Shared vocabulary for the POS order backend: typed identifiers,
//! fixed-point money, and lifecycle enums.

pub mod money;
pub mod status;
pub mod types;

pub use money::{Money, TaxRate};
pub use status::{OrderStatus, PaymentMethod};
pub use types::{
    CategoryId, CustomerId, OperatorId, OrderId, OrderItemId, PaymentId, ProductId, Version,
};
