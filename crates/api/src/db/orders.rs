//! Order repository for database operations.
//!
//! Stock is reserved with conditional decrements (`WHERE stock >= quantity`)
//! inside the order-creation transaction, so two concurrent checkouts can
//! never both take the last unit.

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use verdura_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, order_number, user_id, order_status, payment_method, \
     payment_status, payment_intent_id, gateway_status, shipping_address, \
     subtotal, tax, shipping_cost, total_amount, cancelled_at, cancel_reason, \
     created_at, updated_at";

/// Outcome of attempting to create an order.
#[derive(Debug)]
pub enum OrderCreate {
    /// Order persisted; stock was decremented for every line.
    Created(Order),
    /// A line could not be covered by the product's stock. Nothing was
    /// persisted.
    OutOfStock { product_id: ProductId, available: i32 },
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order, decrementing stock for every line in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number is already
    /// taken. Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewOrder<'_>) -> Result<OrderCreate, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Decrement in product-id order so concurrent checkouts over
        // overlapping products cannot deadlock.
        let mut lines: Vec<_> = new.items.iter().collect();
        lines.sort_by_key(|line| line.product_id.as_i64());

        for line in &lines {
            let result = sqlx::query(
                r"
                UPDATE products
                SET stock = stock - $2, updated_at = NOW()
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: i32 = sqlx::query_scalar(
                    "SELECT COALESCE((SELECT stock FROM products WHERE id = $1), 0)",
                )
                .bind(line.product_id)
                .fetch_one(&mut *tx)
                .await?;

                // Dropping the transaction undoes earlier decrements.
                return Ok(OrderCreate::OutOfStock {
                    product_id: line.product_id,
                    available,
                });
            }
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders (order_number, user_id, payment_method, payment_intent_id,
                                shipping_address, subtotal, tax, shipping_cost, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(new.order_number)
        .bind(new.user_id)
        .bind(new.payment_method)
        .bind(new.payment_intent_id)
        .bind(Json(new.shipping_address))
        .bind(new.totals.subtotal)
        .bind(new.totals.tax)
        .bind(new.totals.shipping_cost)
        .bind(new.totals.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("order number already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        for line in new.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(OrderCreate::Created(order))
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// The order's line items, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, name, unit_price, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Line items for several orders at once, grouped by order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for_orders(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        let raw: Vec<i64> = order_ids.iter().map(|id| id.as_i64()).collect();

        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, name, unit_price, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }

        Ok(grouped)
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Every order in the system, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Number of orders ever placed. Feeds the order number sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Mark an order paid and confirmed, recording the gateway's status
    /// string.
    ///
    /// The update is conditional on `payment_status` still being pending,
    /// so two racing verification calls cannot both claim the payment.
    /// Returns `None` when the order was already paid (or vanished).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        gateway_status: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET payment_status = 'completed',
                order_status = 'confirmed',
                gateway_status = $2,
                updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending'
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(gateway_status)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Cancel an order that is still pending or confirmed, restoring stock
    /// for its lines.
    ///
    /// The status guard lives in the UPDATE itself, so a cancellation racing
    /// a shipment cannot cancel an order that already moved on. Returns
    /// `None` when the guard did not match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn cancel(
        &self,
        id: OrderId,
        reason: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET order_status = 'cancelled',
                cancelled_at = NOW(),
                cancel_reason = $2,
                updated_at = NOW()
            WHERE id = $1 AND order_status IN ('pending', 'confirmed')
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(reason)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        restock_items(&mut tx, id).await?;

        tx.commit().await?;

        Ok(Some(order))
    }

    /// Move an order from one status to another, compare-and-swap style.
    ///
    /// The caller validates that the transition is allowed; this method
    /// only guarantees the order really was in `from` at the moment of the
    /// update. A transition into `Cancelled` restores stock and records the
    /// reason. Returns `None` when the order was not in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        cancel_reason: Option<&str>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET order_status = $3,
                cancelled_at = CASE WHEN $3 = 'cancelled'::order_status THEN NOW() ELSE cancelled_at END,
                cancel_reason = COALESCE($4, cancel_reason),
                updated_at = NOW()
            WHERE id = $1 AND order_status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(cancel_reason)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        if to == OrderStatus::Cancelled {
            restock_items(&mut tx, id).await?;
        }

        tx.commit().await?;

        Ok(Some(order))
    }
}

/// Return every line's quantity to its product's stock.
///
/// Lines are summed per product first; an UPDATE .. FROM joining the raw
/// lines would apply only one row per product when an order repeats one.
async fn restock_items(conn: &mut PgConnection, order_id: OrderId) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE products p
        SET stock = p.stock + oi.total, updated_at = NOW()
        FROM (
            SELECT product_id, SUM(quantity)::INT AS total
            FROM order_items
            WHERE order_id = $1
            GROUP BY product_id
        ) oi
        WHERE oi.product_id = p.id
        ",
    )
    .bind(order_id)
    .execute(conn)
    .await?;

    Ok(())
}
