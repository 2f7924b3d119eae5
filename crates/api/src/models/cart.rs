//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdura_core::{CartId, Money, ProductId, UserId};

/// A user's cart. One per user, created lazily on first access.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning user.
    pub user_id: UserId,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with its product's current name, price, and stock.
///
/// Prices here are live catalog prices; amounts are only frozen into an
/// order at checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product in the cart.
    pub product_id: ProductId,
    /// Product's current display name.
    pub name: String,
    /// Product's current unit price.
    pub unit_price: Money,
    /// Image URL for display, if the product has one.
    pub image: Option<String>,
    /// Units currently in stock for the product.
    pub stock: i32,
    /// Quantity in the cart.
    pub quantity: i32,
}

/// The cart as returned from the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartLine>,
}
