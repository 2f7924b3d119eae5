//! Category route handlers.
//!
//! Reads are public; writes require the admin role. Slugs are always
//! derived server-side from the name.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use verdura_core::CategoryId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Category create/update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// List all categories.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let catalog = CatalogService::new(state.pool());

    Ok(Json(catalog.list_categories().await?))
}

/// Category detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>> {
    let catalog = CatalogService::new(state.pool());

    Ok(Json(catalog.get_category(CategoryId::new(id)).await?))
}

/// Create a category.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let catalog = CatalogService::new(state.pool());
    let category = catalog
        .create_category(&input.name, input.description.as_deref())
        .await?;

    Ok(Json(category))
}

/// Rename a category. The slug is recomputed from the new name.
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let catalog = CatalogService::new(state.pool());
    let category = catalog
        .update_category(CategoryId::new(id), &input.name, input.description.as_deref())
        .await?;

    Ok(Json(category))
}

/// Delete a category. Products filed under it fall back to uncategorized.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let catalog = CatalogService::new(state.pool());
    catalog.delete_category(CategoryId::new(id)).await?;

    Ok(Json(json!({ "message": "Category deleted" })))
}
