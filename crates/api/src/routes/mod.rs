//! HTTP route handlers and shared application state.

pub mod categories;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;

use checkout::CheckoutCoordinator;
use domain::OrderService;
use store::PosStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: PosStore> {
    pub order_service: OrderService<S>,
    pub checkout_coordinator: CheckoutCoordinator<S>,
    pub store: S,
}

/// Parses a path or body ID string into a UUID, naming the offending field.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {what}: {e}")))
}
