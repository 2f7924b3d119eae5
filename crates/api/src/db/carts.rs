//! Cart repository for database operations.

use sqlx::PgPool;

use verdura_core::{CartId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

/// Outcome of a cart line write.
///
/// Stock problems are normal outcomes here, not errors: the caller decides
/// how to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartWrite {
    /// The line is now at this quantity.
    Applied { quantity: i32 },
    /// The requested quantity would exceed available stock.
    InsufficientStock { available: i32 },
    /// The product no longer exists.
    ProductMissing,
    /// The product is not in the cart.
    LineMissing,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // DO UPDATE rather than DO NOTHING so RETURNING always yields the row.
        let cart = sqlx::query_as::<_, Cart>(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id, user_id, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(cart)
    }

    /// The cart's lines joined with each product's current name, price,
    /// first image, and stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.product_id, p.name, p.price AS unit_price,
                   (p.images)[1] AS image, p.stock, ci.quantity
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add `quantity` units of a product to the cart, merging with any
    /// existing line.
    ///
    /// The merge is a single atomic upsert, so two concurrent adds for the
    /// same line cannot lose one another's quantity. The merged quantity is
    /// checked against stock inside the transaction and the merge is rolled
    /// back if it exceeds it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartWrite, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(available) = stock else {
            return Ok(CartWrite::ProductMissing);
        };

        let merged: i32 = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        if merged > available {
            // Dropping the transaction rolls the merge back.
            return Ok(CartWrite::InsufficientStock { available });
        }

        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CartWrite::Applied { quantity: merged })
    }

    /// Set a cart line to an absolute quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartWrite, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(available) = stock else {
            return Ok(CartWrite::ProductMissing);
        };

        if quantity > available {
            return Ok(CartWrite::InsufficientStock { available });
        }

        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = $3, updated_at = NOW()
            WHERE cart_id = $1 AND product_id = $2
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(CartWrite::LineMissing);
        }

        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CartWrite::Applied { quantity })
    }

    /// Remove a product from the cart.
    ///
    /// # Returns
    ///
    /// Returns `true` if a line was removed, `false` if the product wasn't
    /// in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
