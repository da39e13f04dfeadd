//! Order lifecycle endpoints: CRUD, item lines, checkout, and cancellation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, Money, OperatorId, OrderId, OrderStatus, PaymentMethod, ProductId};
use domain::OrderChanges;
use serde::{Deserialize, Serialize};
use store::{NewOrder, Order, OrderFilter, OrderItem, PosStore};

use crate::error::ApiError;
use crate::routes::payments::{self, PaymentResponse};
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub operator_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_id: Option<String>,
    pub operator_id: Option<String>,
    pub discount_cents: Option<i64>,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: Option<i32>,
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub amount_cents: i64,
    pub method: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub customer_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: Option<String>,
    pub operator_id: Option<String>,
    pub status: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub grand_total_cents: i64,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

/// Order fields without item lines, for listings and receipts.
#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub customer_id: Option<String>,
    pub operator_id: Option<String>,
    pub status: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub grand_total_cents: i64,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: OrderSummaryResponse,
    pub payment: PaymentResponse,
}

// -- Handlers --

/// GET /orders — list orders, filtered by `?status=` and `?customer_id=`.
#[tracing::instrument(skip(state))]
pub async fn list<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let status = match query.status {
        Some(ref raw) => Some(
            OrderStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {raw}")))?,
        ),
        None => None,
    };
    let customer_id = match query.customer_id {
        Some(ref raw) => Some(CustomerId::from_uuid(parse_id(raw, "customer_id")?)),
        None => None,
    };

    let orders = state
        .order_service
        .list_orders(OrderFilter {
            status,
            customer_id,
        })
        .await?;

    Ok(Json(orders.iter().map(summary_response).collect()))
}

/// POST /orders — open a new pending order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = match req.customer_id {
        Some(ref raw) => Some(CustomerId::from_uuid(parse_id(raw, "customer_id")?)),
        None => None,
    };
    let operator_id = match req.operator_id {
        Some(ref raw) => Some(OperatorId::from_uuid(parse_id(raw, "operator_id")?)),
        None => None,
    };

    let order = state
        .order_service
        .create_order(NewOrder {
            customer_id,
            operator_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&order, &[]))))
}

/// GET /orders/{id} — fetch an order with its item lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    let aggregate = state.order_service.get_order(order_id).await?;
    Ok(Json(to_response(aggregate.order(), aggregate.items())))
}

/// PUT /orders/{id} — assign customer or operator, or set a discount.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    let customer_id = match req.customer_id {
        Some(ref raw) => Some(CustomerId::from_uuid(parse_id(raw, "customer_id")?)),
        None => None,
    };
    let operator_id = match req.operator_id {
        Some(ref raw) => Some(OperatorId::from_uuid(parse_id(raw, "operator_id")?)),
        None => None,
    };

    let aggregate = state
        .order_service
        .update_order(
            order_id,
            OrderChanges {
                customer_id,
                operator_id,
                discount: req.discount_cents.map(Money::from_cents),
            },
        )
        .await?;

    Ok(Json(to_response(aggregate.order(), aggregate.items())))
}

/// DELETE /orders/{id} — delete an order and its item lines.
#[tracing::instrument(skip(state))]
pub async fn remove<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    state.order_service.delete_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /orders/{id}/items — add a product line, merging repeat products.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    let product_id = ProductId::from_uuid(parse_id(&req.product_id, "product_id")?);
    let quantity = req.quantity.unwrap_or(1);

    let aggregate = state
        .order_service
        .add_item(order_id, product_id, quantity)
        .await?;

    Ok(Json(to_response(aggregate.order(), aggregate.items())))
}

/// POST /orders/{id}/checkout — take payment and complete the order.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    let method = PaymentMethod::parse(&req.method)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid payment method: {}", req.method)))?;

    let receipt = state
        .checkout_coordinator
        .checkout(
            order_id,
            checkout::CheckoutRequest {
                amount: Money::from_cents(req.amount_cents),
                method,
                transaction_id: req.transaction_id,
            },
        )
        .await?;

    Ok(Json(CheckoutResponse {
        order: summary_response(&receipt.order),
        payment: payments::to_response(&receipt.payment),
    }))
}

/// POST /orders/{id}/cancel — cancel a pending order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    let aggregate = state.order_service.cancel_order(order_id).await?;
    Ok(Json(to_response(aggregate.order(), aggregate.items())))
}

/// GET /orders/{id}/payment — fetch the payment recorded for an order.
#[tracing::instrument(skip(state))]
pub async fn payment<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id, "order ID")?);
    let payment = state
        .store
        .get_payment_for_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No payment for order {id}")))?;

    Ok(Json(payments::to_response(&payment)))
}

fn to_response(order: &Order, items: &[OrderItem]) -> OrderResponse {
    OrderResponse {
        id: order.id.to_string(),
        customer_id: order.customer_id.map(|c| c.to_string()),
        operator_id: order.operator_id.map(|o| o.to_string()),
        status: order.status.to_string(),
        total_cents: order.total.cents(),
        tax_cents: order.tax.cents(),
        discount_cents: order.discount.cents(),
        grand_total_cents: order.grand_total.cents(),
        version: order.version.as_i64(),
        created_at: order.created_at.to_rfc3339(),
        updated_at: order.updated_at.to_rfc3339(),
        items: items.iter().map(item_response).collect(),
    }
}

fn item_response(item: &OrderItem) -> OrderItemResponse {
    OrderItemResponse {
        id: item.id.to_string(),
        product_id: item.product_id.to_string(),
        quantity: item.quantity,
        unit_price_cents: item.unit_price.cents(),
        total_cents: item.total.cents(),
    }
}

fn summary_response(order: &Order) -> OrderSummaryResponse {
    OrderSummaryResponse {
        id: order.id.to_string(),
        customer_id: order.customer_id.map(|c| c.to_string()),
        operator_id: order.operator_id.map(|o| o.to_string()),
        status: order.status.to_string(),
        total_cents: order.total.cents(),
        tax_cents: order.tax.cents(),
        discount_cents: order.discount.cents(),
        grand_total_cents: order.grand_total.cents(),
        version: order.version.as_i64(),
        created_at: order.created_at.to_rfc3339(),
        updated_at: order.updated_at.to_rfc3339(),
    }
}
