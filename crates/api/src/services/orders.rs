//! Order workflow: checkout, payment verification, cancellation, and
//! fulfillment status.
//!
//! Checkout snapshots names and unit prices from the catalog and recomputes
//! every total server-side. Stock is reserved by the repository's conditional
//! decrements, so validation here only exists to fail fast with a readable
//! message.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use verdura_core::pricing::{ONLINE_PAYMENT_MINIMUM, OrderTotals, PricedItem};
use verdura_core::{
    Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId, UserRole,
};

use crate::db::orders::OrderCreate;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{CheckoutItem, NewOrder, NewOrderLine, Order, OrderView, ShippingAddress};
use crate::services::notifier::Notifier;
use crate::services::payments::{GatewayError, INTENT_STATUS_SUCCEEDED, PaymentGateway};

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout with no items.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// A line quantity below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A requested product doesn't exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Not enough stock to cover a line.
    #[error("insufficient stock for {name}: only {available} available")]
    OutOfStock {
        name: String,
        available: i32,
        requested: i32,
    },

    /// Online payment requested for a total below the minimum.
    #[error(
        "order total {total} is below the online payment minimum of {minimum}; \
         use cash on delivery instead"
    )]
    BelowMinimum { minimum: Money, total: Money },

    /// Total cannot be expressed in the gateway's minor units.
    #[error("order total cannot be charged")]
    TotalOutOfRange,

    /// Order doesn't exist.
    #[error("order not found")]
    NotFound,

    /// Authenticated user no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Caller doesn't own the order.
    #[error("not your order")]
    Forbidden,

    /// Supplied intent doesn't match the one stored on the order.
    #[error("payment intent does not match this order")]
    IntentMismatch,

    /// Gateway hasn't reported the payment as succeeded yet.
    #[error("payment has not succeeded (status: {status})")]
    PaymentNotSucceeded { status: String },

    /// Payment was already recorded for this order.
    #[error("order is already paid")]
    AlreadyPaid,

    /// Order has moved past the cancellable statuses.
    #[error("order can no longer be cancelled (status: {status})")]
    NotCancellable { status: OrderStatus },

    /// Requested status change isn't allowed from the current status.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Payment gateway error.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of an online checkout: the pending order plus the client secret
/// the frontend needs to collect payment.
#[derive(Debug)]
pub struct OnlineCheckout {
    pub order: OrderView,
    pub client_secret: String,
}

/// Checkout lines priced from the catalog.
struct PricedLines {
    lines: Vec<NewOrderLine>,
    totals: OrderTotals,
}

/// Order workflow service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    users: UserRepository<'a>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Notifier,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            users: UserRepository::new(pool),
            gateway,
            notifier,
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place a cash-on-delivery order. The order starts pending with payment
    /// pending, and a confirmation email goes out in the background.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OutOfStock` if any line cannot be covered.
    pub async fn checkout_cod(
        &self,
        user_id: UserId,
        items: &[CheckoutItem],
        address: &ShippingAddress,
    ) -> Result<OrderView, OrderError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;

        let priced = self.price_items(items).await?;
        let order = self
            .place(user_id, PaymentMethod::Cod, None, address, priced)
            .await?;

        let view = self.view(order).await?;
        self.spawn_email(user.email.into_inner(), view.clone(), EmailKind::Confirmation);

        Ok(view)
    }

    /// Start an online checkout: create a payment intent for the computed
    /// total and persist the order as pending against that intent.
    ///
    /// No email goes out here; confirmation is sent once the payment is
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::BelowMinimum` if the total is under the online
    /// payment minimum. Returns `OrderError::Gateway` if intent creation
    /// fails.
    pub async fn checkout_online(
        &self,
        user_id: UserId,
        items: &[CheckoutItem],
        address: &ShippingAddress,
    ) -> Result<OnlineCheckout, OrderError> {
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(OrderError::UserNotFound);
        }

        let priced = self.price_items(items).await?;

        if !priced.totals.meets_online_minimum() {
            return Err(OrderError::BelowMinimum {
                minimum: ONLINE_PAYMENT_MINIMUM,
                total: priced.totals.total_amount,
            });
        }

        let amount_minor = priced
            .totals
            .total_amount
            .minor_units()
            .ok_or(OrderError::TotalOutOfRange)?;

        let intent = self.gateway.create_intent(amount_minor, user_id).await?;

        let order = self
            .place(
                user_id,
                PaymentMethod::Online,
                Some(&intent.id),
                address,
                priced,
            )
            .await?;

        let order = self.view(order).await?;

        Ok(OnlineCheckout {
            order,
            client_secret: intent.client_secret,
        })
    }

    /// Confirm an online order once its payment went through.
    ///
    /// The caller must own the order and present the same intent the order
    /// was created against. The gateway is then asked directly; anything
    /// short of a succeeded payment leaves the order untouched.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::IntentMismatch` if the supplied intent is not
    /// the order's. Returns `OrderError::PaymentNotSucceeded` if the gateway
    /// hasn't settled the payment. Returns `OrderError::AlreadyPaid` if the
    /// payment was already recorded.
    pub async fn verify_payment(
        &self,
        user_id: UserId,
        order_id: OrderId,
        intent_id: &str,
    ) -> Result<OrderView, OrderError> {
        let order = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;

        if order.user_id != user_id {
            return Err(OrderError::Forbidden);
        }

        let stored = order
            .payment_intent_id
            .as_deref()
            .ok_or(OrderError::IntentMismatch)?;
        if stored != intent_id {
            return Err(OrderError::IntentMismatch);
        }

        if order.payment_status == PaymentStatus::Completed {
            return Err(OrderError::AlreadyPaid);
        }

        // Trust the gateway, not the client, on whether money moved.
        let intent = self.gateway.retrieve_intent(stored).await?;
        if intent.status != INTENT_STATUS_SUCCEEDED {
            return Err(OrderError::PaymentNotSucceeded {
                status: intent.status,
            });
        }

        let paid = self
            .orders
            .mark_paid(order_id, &intent.status)
            .await?
            .ok_or(OrderError::AlreadyPaid)?;

        let view = self.view(paid).await?;

        if let Some(user) = self.users.get_by_id(user_id).await? {
            self.spawn_email(user.email.into_inner(), view.clone(), EmailKind::Confirmation);
        }

        Ok(view)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn my_orders(&self, user_id: UserId) -> Result<Vec<OrderView>, OrderError> {
        let orders = self.orders.list_for_user(user_id).await?;
        Ok(self.views(orders).await?)
    }

    /// A single order, visible to its owner and to admins.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` if the caller may not see it.
    pub async fn get(
        &self,
        viewer_id: UserId,
        viewer_role: UserRole,
        order_id: OrderId,
    ) -> Result<OrderView, OrderError> {
        let order = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;

        if order.user_id != viewer_id && viewer_role != UserRole::Admin {
            return Err(OrderError::Forbidden);
        }

        self.view(order).await.map_err(OrderError::from)
    }

    /// Every order in the system, newest first. Admin only; the route layer
    /// enforces that.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderView>, OrderError> {
        let orders = self.orders.list_all().await?;
        Ok(self.views(orders).await?)
    }

    // =========================================================================
    // Cancellation & Fulfillment
    // =========================================================================

    /// Cancel an order. Only the owner can cancel, and only while the order
    /// is pending or confirmed. Stock returns to the shelf.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` if the caller doesn't own the order.
    /// Returns `OrderError::NotCancellable` once the order has shipped or
    /// further.
    pub async fn cancel(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reason: Option<&str>,
    ) -> Result<OrderView, OrderError> {
        let order = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;

        // Owner only; admins cancel through the status endpoint.
        if order.user_id != user_id {
            return Err(OrderError::Forbidden);
        }

        if !order.order_status.is_cancellable() {
            return Err(OrderError::NotCancellable {
                status: order.order_status,
            });
        }

        let reason = reason.unwrap_or("Cancelled by user");
        let Some(cancelled) = self.orders.cancel(order_id, reason).await? else {
            // Lost a race with a status change; re-read for the real answer.
            let current = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;
            return Err(OrderError::NotCancellable {
                status: current.order_status,
            });
        };

        let view = self.view(cancelled).await?;

        if let Some(user) = self.users.get_by_id(user_id).await? {
            self.spawn_email(user.email.into_inner(), view.clone(), EmailKind::Status);
        }

        Ok(view)
    }

    /// Move an order along the fulfillment path. Admin only; the route layer
    /// enforces that. A move into cancelled restores stock and records that
    /// an admin did it.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidTransition` if the order's status doesn't
    /// allow the move.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        to: OrderStatus,
    ) -> Result<OrderView, OrderError> {
        let order = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;
        let from = order.order_status;

        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        let reason = (to == OrderStatus::Cancelled).then_some("Cancelled by admin");

        let Some(updated) = self.orders.update_status(order_id, from, to, reason).await? else {
            // Someone else moved the order first; report the fresh status.
            let current = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;
            return Err(OrderError::InvalidTransition {
                from: current.order_status,
                to,
            });
        };

        let view = self.view(updated).await?;

        if let Some(user) = self.users.get_by_id(view.user_id).await? {
            self.spawn_email(user.email.into_inner(), view.clone(), EmailKind::Status);
        }

        Ok(view)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Snapshot names and prices from the catalog and compute the totals.
    async fn price_items(&self, items: &[CheckoutItem]) -> Result<PricedLines, OrderError> {
        validate_items(items)?;

        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let products = self.products.by_ids(&ids).await?;
        let by_id: HashMap<ProductId, _> = products.iter().map(|p| (p.id, p)).collect();

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = by_id
                .get(&item.product_id)
                .ok_or(OrderError::ProductNotFound(item.product_id))?;

            // Fail fast with the product's name. The conditional decrement
            // at insert time is what actually guarantees the stock.
            if product.stock < item.quantity {
                return Err(OrderError::OutOfStock {
                    name: product.name.clone(),
                    available: product.stock,
                    requested: item.quantity,
                });
            }

            lines.push(NewOrderLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: item.quantity,
            });
        }

        let priced: Vec<PricedItem> = lines
            .iter()
            .map(|line| PricedItem::new(line.unit_price, line.quantity))
            .collect();

        Ok(PricedLines {
            lines,
            totals: OrderTotals::calculate(&priced),
        })
    }

    /// Persist the priced order, mapping a failed stock reservation back to
    /// the line that caused it.
    async fn place(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
        payment_intent_id: Option<&str>,
        address: &ShippingAddress,
        priced: PricedLines,
    ) -> Result<Order, OrderError> {
        let order_number =
            generate_order_number(Utc::now().timestamp_millis(), self.orders.count().await?);

        let new = NewOrder {
            order_number: &order_number,
            user_id,
            payment_method,
            payment_intent_id,
            shipping_address: address,
            totals: priced.totals,
            items: &priced.lines,
        };

        match self.orders.create(&new).await? {
            OrderCreate::Created(order) => Ok(order),
            OrderCreate::OutOfStock {
                product_id,
                available,
            } => Err(out_of_stock(&priced.lines, product_id, available)),
        }
    }

    /// Load the order's items and project the API shape.
    async fn view(&self, order: Order) -> Result<OrderView, RepositoryError> {
        let items = self.orders.items(order.id).await?;
        Ok(order.into_view(items))
    }

    /// Project several orders, batching the item loads into one query.
    async fn views(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, RepositoryError> {
        let ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();
        let mut items = self.orders.items_for_orders(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = items.remove(&order.id).unwrap_or_default();
                order.into_view(lines)
            })
            .collect())
    }

    /// Send an order email in the background. Delivery failures are logged,
    /// never surfaced to the request.
    fn spawn_email(&self, to: String, order: OrderView, kind: EmailKind) {
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let result = match kind {
                EmailKind::Confirmation => notifier.send_order_confirmation(&to, &order).await,
                EmailKind::Status => notifier.send_order_status(&to, &order).await,
            };

            if let Err(e) = result {
                tracing::warn!(
                    order = %order.order_number,
                    error = %e,
                    "Order email failed"
                );
            }
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum EmailKind {
    Confirmation,
    Status,
}

/// Reject empty checkouts and non-positive quantities.
fn validate_items(items: &[CheckoutItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    if items.iter().any(|item| item.quantity < 1) {
        return Err(OrderError::InvalidQuantity);
    }

    Ok(())
}

/// Map a failed stock reservation back to the line that caused it.
fn out_of_stock(lines: &[NewOrderLine], product_id: ProductId, available: i32) -> OrderError {
    lines.iter().find(|line| line.product_id == product_id).map_or(
        OrderError::ProductNotFound(product_id),
        |line| OrderError::OutOfStock {
            name: line.name.clone(),
            available,
            requested: line.quantity,
        },
    )
}

/// Build a human-readable order number from the placement time and the
/// running order count.
fn generate_order_number(now_millis: i64, existing_count: i64) -> String {
    format!("ORD-{now_millis}-{:04}", existing_count + 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product_id: i64, quantity: i32) -> CheckoutItem {
        CheckoutItem {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[test]
    fn test_order_number_format() {
        assert_eq!(
            generate_order_number(1_756_059_211_000, 41),
            "ORD-1756059211000-0042"
        );
    }

    #[test]
    fn test_order_number_sequence_pads_to_four() {
        assert_eq!(generate_order_number(1, 0), "ORD-1-0001");
        assert_eq!(generate_order_number(1, 9_999), "ORD-1-10000");
    }

    #[test]
    fn test_validate_rejects_empty_order() {
        assert!(matches!(validate_items(&[]), Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_validate_rejects_zero_and_negative_quantities() {
        assert!(matches!(
            validate_items(&[item(1, 0)]),
            Err(OrderError::InvalidQuantity)
        ));
        assert!(matches!(
            validate_items(&[item(1, 2), item(2, -3)]),
            Err(OrderError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_validate_accepts_positive_quantities() {
        assert!(validate_items(&[item(1, 1), item(2, 12)]).is_ok());
    }

    #[test]
    fn test_out_of_stock_names_the_line() {
        let lines = vec![
            NewOrderLine {
                product_id: ProductId::new(1),
                name: "Organic Spinach".to_owned(),
                unit_price: Money::new("2.99".parse().unwrap()),
                quantity: 2,
            },
            NewOrderLine {
                product_id: ProductId::new(2),
                name: "Free Range Eggs".to_owned(),
                unit_price: Money::new("4.50".parse().unwrap()),
                quantity: 3,
            },
        ];

        let err = out_of_stock(&lines, ProductId::new(2), 1);
        match err {
            OrderError::OutOfStock {
                name,
                available,
                requested,
            } => {
                assert_eq!(name, "Free Range Eggs");
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("expected OutOfStock, got {other:?}"),
        }
    }
}
