//! HTTP API server with observability for the POS backend.
//!
//! Provides REST endpoints for the catalog, customers, orders, payments,
//! and checkout, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::CheckoutCoordinator;
use common::TaxRate;
use domain::OrderService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{PosStore, StockPolicy};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: PosStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/categories", get(routes::categories::list::<S>))
        .route("/categories", post(routes::categories::create::<S>))
        .route("/categories/{id}", get(routes::categories::get::<S>))
        .route("/categories/{id}", put(routes::categories::update::<S>))
        .route("/categories/{id}", delete(routes::categories::remove::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::remove::<S>))
        .route("/customers", get(routes::customers::list::<S>))
        .route("/customers", post(routes::customers::create::<S>))
        .route("/customers/search", get(routes::customers::search::<S>))
        .route("/customers/{id}", get(routes::customers::get::<S>))
        .route("/customers/{id}", put(routes::customers::update::<S>))
        .route("/customers/{id}", delete(routes::customers::remove::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", put(routes::orders::update::<S>))
        .route("/orders/{id}", delete(routes::orders::remove::<S>))
        .route("/orders/{id}/items", post(routes::orders::add_item::<S>))
        .route("/orders/{id}/checkout", post(routes::orders::checkout::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/payment", get(routes::orders::payment::<S>))
        .route("/payments", get(routes::payments::list::<S>))
        .route("/payments/{id}", get(routes::payments::get::<S>))
        .route("/payments/{id}", put(routes::payments::update::<S>))
        .route("/payments/{id}", delete(routes::payments::remove::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the order service and checkout coordinator over a shared store.
pub fn create_state<S: PosStore + Clone>(
    store: S,
    tax_rate: TaxRate,
    stock_policy: StockPolicy,
) -> Arc<AppState<S>> {
    let order_service = OrderService::new(store.clone(), tax_rate);
    let checkout_coordinator = CheckoutCoordinator::new(store.clone(), stock_policy);

    Arc::new(AppState {
        order_service,
        checkout_coordinator,
        store,
    })
}
