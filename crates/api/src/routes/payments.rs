//! Payment record endpoints.
//!
//! Payments are created by checkout, never posted directly; these
//! endpoints expose the records for lookup and reconciliation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::PaymentId;
use serde::{Deserialize, Serialize};
use store::{Payment, PosStore, UpdatePayment};

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct UpdatePaymentRequest {
    pub transaction_id: Option<String>,
    pub is_completed: Option<bool>,
}

// -- Response types --

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub method: String,
    pub transaction_id: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
}

// -- Handlers --

/// GET /payments — list all payment records.
#[tracing::instrument(skip(state))]
pub async fn list<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state.store.list_payments().await?;
    Ok(Json(payments.iter().map(to_response).collect()))
}

/// GET /payments/{id} — fetch a single payment record.
#[tracing::instrument(skip(state))]
pub async fn get<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment_id = PaymentId::from_uuid(parse_id(&id, "payment ID")?);
    let payment = state.store.get_payment(payment_id).await?;
    Ok(Json(to_response(&payment)))
}

/// PUT /payments/{id} — reconcile the transaction reference or completion flag.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment_id = PaymentId::from_uuid(parse_id(&id, "payment ID")?);
    let payment = state
        .store
        .update_payment(
            payment_id,
            UpdatePayment {
                transaction_id: req.transaction_id,
                is_completed: req.is_completed,
            },
        )
        .await?;

    Ok(Json(to_response(&payment)))
}

/// DELETE /payments/{id} — remove a payment record.
#[tracing::instrument(skip(state))]
pub async fn remove<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let payment_id = PaymentId::from_uuid(parse_id(&id, "payment ID")?);
    state.store.delete_payment(payment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn to_response(payment: &Payment) -> PaymentResponse {
    PaymentResponse {
        id: payment.id.to_string(),
        order_id: payment.order_id.to_string(),
        amount_cents: payment.amount.cents(),
        method: payment.method.to_string(),
        transaction_id: payment.transaction_id.clone(),
        is_completed: payment.is_completed,
        created_at: payment.created_at.to_rfc3339(),
    }
}
