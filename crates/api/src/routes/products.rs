//! Product route handlers.
//!
//! Reads are public. Writes require the admin role, except reviews (any
//! authenticated user) and price alerts (anyone, even guests). A price cut
//! saved through `update` kicks off the alert fan-out in the background.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use verdura_core::{CategoryId, ProductId};

use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAdmin, RequireAuth};
use crate::models::{CreateProductInput, Product, ProductFilter, ProductReview, UpdateProductInput};
use crate::services::catalog::{CatalogService, dispatch_price_drop};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Restrict to one category.
    pub category: Option<i64>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    /// Results per page.
    pub limit: Option<i64>,
}

/// One page of products.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// A product with its reviews inlined, as the detail endpoint returns it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<ProductReview>,
}

/// Review request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub rating: i16,
    pub comment: Option<String>,
}

/// Price alert request body. Logged-in subscribers can omit the email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInput {
    pub email: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List products, filtered and paged.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    let filter = ProductFilter {
        category_id: query.category.map(CategoryId::new),
        search: query.search,
        limit,
        offset: (page - 1) * limit,
    };

    let catalog = CatalogService::new(state.pool());
    let (products, total) = catalog.list_products(&filter).await?;

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        pages: (total + limit - 1) / limit,
    }))
}

/// Product detail with reviews.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetail>> {
    let catalog = CatalogService::new(state.pool());
    let (product, reviews) = catalog.get_product(ProductId::new(id)).await?;

    Ok(Json(ProductDetail { product, reviews }))
}

/// Create a product.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateProductInput>,
) -> Result<Json<Product>> {
    let catalog = CatalogService::new(state.pool());
    let product = catalog.create_product(&input).await?;

    Ok(Json(product))
}

/// Update a product. A strict price cut fans out alert emails in the
/// background; the response never waits for them.
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<Product>> {
    let catalog = CatalogService::new(state.pool());
    let (product, drop) = catalog.update_product(ProductId::new(id), &input).await?;

    if let Some(drop) = drop {
        dispatch_price_drop(state.pool().clone(), state.notifier().clone(), drop);
    }

    Ok(Json(product))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let catalog = CatalogService::new(state.pool());
    catalog.delete_product(ProductId::new(id)).await?;

    Ok(Json(json!({ "message": "Product deleted" })))
}

/// Add a review. One per user per product.
#[instrument(skip(state, input))]
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<ReviewInput>,
) -> Result<Json<ProductReview>> {
    let catalog = CatalogService::new(state.pool());
    let review = catalog
        .add_review(
            ProductId::new(id),
            user.id,
            input.rating,
            input.comment.as_deref(),
        )
        .await?;

    Ok(Json(review))
}

/// Subscribe to price drop alerts. Guests must supply an email; logged-in
/// callers fall back to their account address.
#[instrument(skip(state, input))]
pub async fn subscribe_alert(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    OptionalAuth(user): OptionalAuth,
    input: Option<Json<AlertInput>>,
) -> Result<Json<Value>> {
    let email = input.and_then(|Json(input)| input.email);

    let catalog = CatalogService::new(state.pool());
    catalog
        .subscribe_alert(
            ProductId::new(id),
            user.map(|user| user.id),
            email.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "message": "Subscribed to price alerts" })))
}
