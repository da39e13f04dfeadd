//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{DomainError, OrderError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Checkout coordination error.
    Checkout(CheckoutError),
    /// Storage error.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(&err),
            ApiError::Checkout(err) => checkout_error_to_response(&err),
            ApiError::Store(err) => store_error_to_response(&err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: &DomainError) -> (StatusCode, String) {
    match err {
        DomainError::Store(store_err) => store_error_to_response(store_err),
        DomainError::Order(order_err) => order_error_to_response(order_err),
    }
}

fn order_error_to_response(err: &OrderError) -> (StatusCode, String) {
    match err {
        OrderError::InvalidStateTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        OrderError::InvalidQuantity { .. }
        | OrderError::ProductInactive { .. }
        | OrderError::InvalidDiscount { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

fn checkout_error_to_response(err: &CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::InvalidPayment { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::EmptyOrder { .. } | CheckoutError::OrderNotPending { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::Store(store_err) => store_error_to_response(store_err),
    }
}

fn store_error_to_response(err: &StoreError) -> (StatusCode, String) {
    match err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::VersionConflict { .. }
        | StoreError::OrderNotPending { .. }
        | StoreError::DuplicatePayment { .. }
        | StoreError::DuplicateBarcode { .. }
        | StoreError::ProductInUse { .. }
        | StoreError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!(error = %err, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
