//! Order domain types.
//!
//! Orders freeze product names and unit prices at checkout time so later
//! catalog edits never change what a customer was billed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use verdura_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

/// Delivery address captured at checkout, stored as JSONB on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

/// A placed order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Human-readable order number (e.g., "ORD-1756059211000-0042").
    pub order_number: String,
    /// User who placed the order.
    pub user_id: UserId,
    /// Fulfillment status.
    pub order_status: OrderStatus,
    /// How the customer chose to pay.
    pub payment_method: PaymentMethod,
    /// Whether payment has been collected.
    pub payment_status: PaymentStatus,
    /// Gateway payment intent ID, present for online orders.
    pub payment_intent_id: Option<String>,
    /// Last status reported by the gateway for the intent.
    pub gateway_status: Option<String>,
    /// Delivery address.
    pub shipping_address: Json<ShippingAddress>,
    /// Sum of line totals.
    pub subtotal: Money,
    /// Tax charged on the subtotal.
    pub tax: Money,
    /// Shipping fee, zero above the free-shipping threshold.
    pub shipping_cost: Money,
    /// Grand total the customer pays.
    pub total_amount: Money,
    /// When the order was cancelled, if it was.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Who or what cancelled the order.
    pub cancel_reason: Option<String>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A line item frozen into an order at checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    /// Unique item ID.
    pub id: OrderItemId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Product ordered.
    pub product_id: ProductId,
    /// Product name at checkout time.
    pub name: String,
    /// Unit price at checkout time.
    pub unit_price: Money,
    /// Units ordered.
    pub quantity: i32,
}

/// An order line as returned from the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i32,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

/// An order with its items, as returned from the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItemView>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A requested order line as submitted at checkout. Prices are never taken
/// from the client; only the product reference and quantity are.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A line to freeze into a new order, with the price snapshot already taken.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i32,
}

/// Everything needed to persist a new order.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub user_id: UserId,
    pub payment_method: PaymentMethod,
    pub payment_intent_id: Option<&'a str>,
    pub shipping_address: &'a ShippingAddress,
    pub totals: verdura_core::pricing::OrderTotals,
    pub items: &'a [NewOrderLine],
}

impl Order {
    /// Combine the order row with its items into the API shape.
    #[must_use]
    pub fn into_view(self, items: Vec<OrderItem>) -> OrderView {
        OrderView {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            status: self.order_status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            payment_intent_id: self.payment_intent_id,
            shipping_address: self.shipping_address.0,
            items: items.into_iter().map(OrderItemView::from).collect(),
            subtotal: self.subtotal,
            tax: self.tax,
            shipping_cost: self.shipping_cost,
            total_amount: self.total_amount,
            cancelled_at: self.cancelled_at,
            cancel_reason: self.cancel_reason,
            created_at: self.created_at,
        }
    }
}
