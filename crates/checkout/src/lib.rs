//! Checkout for the POS backend.
//!
//! This crate finalizes pending orders. A checkout runs as one atomic unit:
//! 1. Validate the payment input
//! 2. Transition the order to completed
//! 3. Record the payment
//! 4. Decrement product stock per order line
//!
//! Steps 2-4 run inside a single store transaction; any failure rolls all
//! of them back and the order stays pending.

pub mod coordinator;
pub mod error;

pub use coordinator::{CheckoutCoordinator, CheckoutReceipt, CheckoutRequest};
pub use error::CheckoutError;
