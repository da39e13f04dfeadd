//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{NewProduct, PosStore, Product, ProductFilter, UpdateProduct};

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub stock_quantity: i32,
    pub barcode: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

// -- Handlers --

/// GET /products — list products, optionally filtered by `?category_id=`.
#[tracing::instrument(skip(state))]
pub async fn list<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let category_id = match query.category_id {
        Some(ref raw) => Some(CategoryId::from_uuid(parse_id(raw, "category_id")?)),
        None => None,
    };

    let products = state.store.list_products(ProductFilter { category_id }).await?;
    Ok(Json(products.iter().map(to_response).collect()))
}

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let category_id = CategoryId::from_uuid(parse_id(&req.category_id, "category_id")?);

    let product = state
        .store
        .create_product(NewProduct {
            category_id,
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            cost: Money::from_cents(req.cost_cents.unwrap_or(0)),
            stock_quantity: req.stock_quantity.unwrap_or(0),
            barcode: req.barcode,
            is_active: req.is_active.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&product))))
}

/// GET /products/{id} — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::from_uuid(parse_id(&id, "product ID")?);
    let product = state.store.get_product(product_id).await?;
    Ok(Json(to_response(&product)))
}

/// PUT /products/{id} — update catalog fields, price, or stock level.
///
/// Changing the price never touches lines already on an order; those keep
/// the price frozen when the line was added.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::from_uuid(parse_id(&id, "product ID")?);
    let category_id = match req.category_id {
        Some(ref raw) => Some(CategoryId::from_uuid(parse_id(raw, "category_id")?)),
        None => None,
    };

    let product = state
        .store
        .update_product(
            product_id,
            UpdateProduct {
                category_id,
                name: req.name,
                description: req.description,
                price: req.price_cents.map(Money::from_cents),
                cost: req.cost_cents.map(Money::from_cents),
                stock_quantity: req.stock_quantity,
                barcode: req.barcode,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(Json(to_response(&product)))
}

/// DELETE /products/{id} — remove a product not referenced by any order.
#[tracing::instrument(skip(state))]
pub async fn remove<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let product_id = ProductId::from_uuid(parse_id(&id, "product ID")?);
    state.store.delete_product(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(product: &Product) -> ProductResponse {
    ProductResponse {
        id: product.id.to_string(),
        category_id: product.category_id.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        price_cents: product.price.cents(),
        cost_cents: product.cost.cents(),
        stock_quantity: product.stock_quantity,
        barcode: product.barcode.clone(),
        is_active: product.is_active,
        created_at: product.created_at.to_rfc3339(),
        updated_at: product.updated_at.to_rfc3339(),
    }
}
