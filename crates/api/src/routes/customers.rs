//! Customer CRUD and search endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::CustomerId;
use serde::{Deserialize, Serialize};
use store::{Customer, NewCustomer, PosStore, UpdateCustomer};

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: i32,
}

// -- Handlers --

/// GET /customers — list all customers.
#[tracing::instrument(skip(state))]
pub async fn list<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.store.list_customers().await?;
    Ok(Json(customers.iter().map(to_response).collect()))
}

/// GET /customers/search — case-insensitive name search via `?query=`.
///
/// An empty or missing query matches everyone.
#[tracing::instrument(skip(state))]
pub async fn search<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let term = query.query.unwrap_or_default();
    let customers = state.store.search_customers(&term).await?;
    Ok(Json(customers.iter().map(to_response).collect()))
}

/// POST /customers — register a customer.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = state
        .store
        .create_customer(NewCustomer {
            name: req.name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            loyalty_points: req.loyalty_points.unwrap_or(0),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&customer))))
}

/// GET /customers/{id} — fetch a single customer.
#[tracing::instrument(skip(state))]
pub async fn get<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_id(&id, "customer ID")?);
    let customer = state.store.get_customer(customer_id).await?;
    Ok(Json(to_response(&customer)))
}

/// PUT /customers/{id} — update contact details or loyalty points.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_id(&id, "customer ID")?);
    let customer = state
        .store
        .update_customer(
            customer_id,
            UpdateCustomer {
                name: req.name,
                phone: req.phone,
                email: req.email,
                address: req.address,
                loyalty_points: req.loyalty_points,
            },
        )
        .await?;

    Ok(Json(to_response(&customer)))
}

/// DELETE /customers/{id} — remove a customer.
///
/// Orders that referenced the customer keep their history; the reference
/// is cleared rather than cascading.
#[tracing::instrument(skip(state))]
pub async fn remove<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_id(&id, "customer ID")?);
    state.store.delete_customer(customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(customer: &Customer) -> CustomerResponse {
    CustomerResponse {
        id: customer.id.to_string(),
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        email: customer.email.clone(),
        address: customer.address.clone(),
        loyalty_points: customer.loyalty_points,
    }
}
