//! Cart route handlers.
//!
//! All endpoints require authentication and operate on the caller's own
//! cart. Every mutation returns the refreshed cart so the client never has
//! to issue a follow-up read.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::instrument;

use verdura_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body for add and update operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: i64,
    pub quantity: i32,
}

/// The caller's cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool());
    let view = cart.view(user.id).await?;

    Ok(Json(view))
}

/// Add units of a product, merging with any line already present.
#[instrument(skip(state, input))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CartItemInput>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool());
    let view = cart
        .add_item(user.id, ProductId::new(input.product_id), input.quantity)
        .await?;

    Ok(Json(view))
}

/// Set a line to an absolute quantity.
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CartItemInput>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool());
    let view = cart
        .update_item(user.id, ProductId::new(input.product_id), input.quantity)
        .await?;

    Ok(Json(view))
}

/// Remove a product from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool());
    let view = cart.remove_item(user.id, ProductId::new(product_id)).await?;

    Ok(Json(view))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool());
    let view = cart.clear(user.id).await?;

    Ok(Json(view))
}
