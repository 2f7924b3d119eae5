//! Cart service.
//!
//! One cart per user, created on first touch. Every mutation re-validates
//! the affected line against current stock and returns the refreshed cart.

use sqlx::PgPool;
use thiserror::Error;

use verdura_core::{ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::carts::{CartRepository, CartWrite};
use crate::models::CartView;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Product doesn't exist.
    #[error("product not found")]
    ProductNotFound,

    /// Requested quantity exceeds stock.
    #[error("insufficient stock: only {available} available")]
    InsufficientStock { available: i32, requested: i32 },

    /// Quantity below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Product is not in the cart.
    #[error("item not in cart")]
    ItemNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
        }
    }

    /// The user's cart with live product details.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;
        let items = self.carts.lines(cart.id).await?;

        Ok(CartView {
            id: cart.id,
            items,
        })
    }

    /// Add units of a product, merging with any existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`.
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    /// Returns `CartError::InsufficientStock` if the merged line would
    /// exceed stock.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let cart = self.carts.get_or_create(user_id).await?;
        let write = self.carts.add_item(cart.id, product_id, quantity).await?;
        apply_write(write, quantity)?;

        let items = self.carts.lines(cart.id).await?;
        Ok(CartView {
            id: cart.id,
            items,
        })
    }

    /// Set a line to an absolute quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`.
    /// Returns `CartError::ItemNotFound` if the product isn't in the cart.
    /// Returns `CartError::InsufficientStock` if the quantity exceeds stock.
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let cart = self.carts.get_or_create(user_id).await?;
        let write = self.carts.update_item(cart.id, product_id, quantity).await?;
        apply_write(write, quantity)?;

        let items = self.carts.lines(cart.id).await?;
        Ok(CartView {
            id: cart.id,
            items,
        })
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the product isn't in the cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;

        if !self.carts.remove_item(cart.id, product_id).await? {
            return Err(CartError::ItemNotFound);
        }

        let items = self.carts.lines(cart.id).await?;
        Ok(CartView {
            id: cart.id,
            items,
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;
        self.carts.clear(cart.id).await?;

        Ok(CartView {
            id: cart.id,
            items: Vec::new(),
        })
    }
}

/// Translate a repository write outcome into a service error.
const fn apply_write(write: CartWrite, requested: i32) -> Result<(), CartError> {
    match write {
        CartWrite::Applied { .. } => Ok(()),
        CartWrite::InsufficientStock { available } => Err(CartError::InsufficientStock {
            available,
            requested,
        }),
        CartWrite::ProductMissing => Err(CartError::ProductNotFound),
        CartWrite::LineMissing => Err(CartError::ItemNotFound),
    }
}
