//! Category CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CategoryId;
use serde::{Deserialize, Serialize};
use store::{Category, NewCategory, PosStore, UpdateCategory};

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

// -- Handlers --

/// GET /categories — list all categories.
#[tracing::instrument(skip(state))]
pub async fn list<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories.iter().map(to_response).collect()))
}

/// POST /categories — create a category.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state
        .store
        .create_category(NewCategory {
            name: req.name,
            description: req.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&category))))
}

/// GET /categories/{id} — fetch a single category.
#[tracing::instrument(skip(state))]
pub async fn get<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category_id = CategoryId::from_uuid(parse_id(&id, "category ID")?);
    let category = state.store.get_category(category_id).await?;
    Ok(Json(to_response(&category)))
}

/// PUT /categories/{id} — update name or description.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category_id = CategoryId::from_uuid(parse_id(&id, "category ID")?);
    let category = state
        .store
        .update_category(
            category_id,
            UpdateCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(to_response(&category)))
}

/// DELETE /categories/{id} — remove a category and its products.
///
/// Fails with a conflict if any product in the category appears on an order.
#[tracing::instrument(skip(state))]
pub async fn remove<S: PosStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let category_id = CategoryId::from_uuid(parse_id(&id, "category ID")?);
    state.store.delete_category(category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id.to_string(),
        name: category.name.clone(),
        description: category.description.clone(),
    }
}
