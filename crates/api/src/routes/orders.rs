//! Order route handlers.
//!
//! Checkout comes in two flavors. Cash on delivery confirms immediately;
//! online checkout creates a payment intent and the order stays pending
//! until the client calls back with `verify-payment` and the gateway
//! confirms the charge. Admin endpoints live under `/orders/admin`.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use verdura_core::{OrderId, OrderStatus};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{CheckoutItem, OrderView, ShippingAddress};
use crate::services::orders::OrderService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Checkout request body, shared by both payment paths.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
}

/// Body for confirming an online payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentInput {
    pub order_id: i64,
    pub payment_intent_id: String,
}

/// Admin status change body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

/// Optional cancellation body; the reason defaults when omitted.
#[derive(Debug, Deserialize)]
pub struct CancelInput {
    pub reason: Option<String>,
}

/// Pending order plus the client secret the frontend needs to collect
/// payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub order: OrderView,
    pub client_secret: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Place a cash-on-delivery order.
#[instrument(skip(state, input))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CheckoutInput>,
) -> Result<Json<OrderView>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let order = orders
        .checkout_cod(user.id, &input.items, &input.shipping_address)
        .await?;

    Ok(Json(order))
}

/// Place an online order and open a payment intent for it.
#[instrument(skip(state, input))]
pub async fn create_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CheckoutInput>,
) -> Result<Json<CreatePaymentResponse>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let checkout = orders
        .checkout_online(user.id, &input.items, &input.shipping_address)
        .await?;

    Ok(Json(CreatePaymentResponse {
        order: checkout.order,
        client_secret: checkout.client_secret,
    }))
}

/// Confirm an online payment against the gateway and mark the order paid.
#[instrument(skip(state, input))]
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<VerifyPaymentInput>,
) -> Result<Json<OrderView>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let order = orders
        .verify_payment(
            user.id,
            OrderId::new(input.order_id),
            &input.payment_intent_id,
        )
        .await?;

    Ok(Json(order))
}

/// The caller's order history, newest first.
#[instrument(skip(state))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let views = orders.my_orders(user.id).await?;

    Ok(Json(views))
}

/// A single order. Owners and admins only.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<OrderView>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let order = orders.get(user.id, user.role, OrderId::new(id)).await?;

    Ok(Json(order))
}

/// Cancel an order that hasn't shipped yet. Stock goes back on the shelf.
#[instrument(skip(state, input))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAuth(user): RequireAuth,
    input: Option<Json<CancelInput>>,
) -> Result<Json<OrderView>> {
    let reason = input.as_ref().and_then(|body| body.reason.as_deref());

    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let order = orders.cancel(user.id, OrderId::new(id), reason).await?;

    Ok(Json(order))
}

/// Every order in the system, newest first.
#[instrument(skip(state))]
pub async fn admin_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let views = orders.list_all().await?;

    Ok(Json(views))
}

/// Move an order along the fulfillment pipeline.
#[instrument(skip(state, input))]
pub async fn admin_update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<UpdateStatusInput>,
) -> Result<Json<OrderView>> {
    let orders = OrderService::new(state.pool(), state.gateway(), state.notifier().clone());
    let order = orders.update_status(OrderId::new(id), input.status).await?;

    Ok(Json(order))
}
