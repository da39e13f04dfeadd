//! Domain layer for the POS backend.
//!
//! This crate provides the order aggregate and its service:
//! - OrderAggregate enforcing the order lifecycle and totals arithmetic
//! - OrderChanges describing field-level order updates
//! - OrderService wrapping load-mutate-save with optimistic retries

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{OrderAggregate, OrderChanges, OrderError, OrderService};
