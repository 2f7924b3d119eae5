//! Catalog service: categories, products, reviews, and price alerts.
//!
//! Price drops are detected here on product updates and fanned out to
//! subscribers on a background task, so the admin's update request never
//! waits on email delivery.

use sqlx::PgPool;
use thiserror::Error;
use tokio::task::JoinSet;

use verdura_core::{CategoryId, Email, Money, ProductId, UserId};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::category::slugify;
use crate::models::{
    Category, CreateProductInput, Product, ProductFilter, ProductReview, UpdateProductInput,
};
use crate::services::notifier::Notifier;

/// Most price-drop emails in flight at once.
const PRICE_DROP_SEND_CONCURRENCY: usize = 8;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Category doesn't exist.
    #[error("category not found")]
    CategoryNotFound,

    /// Category name already taken.
    #[error("category already exists")]
    CategoryExists,

    /// Product doesn't exist.
    #[error("product not found")]
    ProductNotFound,

    /// User already reviewed this product.
    #[error("product already reviewed")]
    DuplicateReview,

    /// Rating outside 1..=5.
    #[error("rating must be between 1 and 5")]
    InvalidRating,

    /// Already subscribed to price alerts for this product.
    #[error("already subscribed to price alerts")]
    DuplicateAlert,

    /// No email available for the subscription.
    #[error("email is required to subscribe")]
    MissingEmail,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] verdura_core::EmailError),

    /// Subscriber's account no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A detected price drop, ready for fan-out.
#[derive(Debug, Clone)]
pub struct PriceDrop {
    pub product_id: ProductId,
    pub product_name: String,
    pub old_price: Money,
    pub new_price: Money,
}

/// Catalog service.
pub struct CatalogService<'a> {
    categories: CategoryRepository<'a>,
    products: ProductRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
            products: ProductRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if a query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list().await?)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if it doesn't exist.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.categories
            .get(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)
    }

    /// Create a category. The slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryExists` if the name is taken.
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, CatalogError> {
        let slug = slugify(name);

        self.categories
            .create(name, &slug, description)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CatalogError::CategoryExists,
                other => CatalogError::Repository(other),
            })
    }

    /// Rename a category. The slug is recomputed from the new name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if it doesn't exist.
    /// Returns `CatalogError::CategoryExists` if the new name is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, CatalogError> {
        let slug = slugify(name);

        self.categories
            .update(id, name, &slug, description)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CatalogError::CategoryExists,
                RepositoryError::NotFound => CatalogError::CategoryNotFound,
                other => CatalogError::Repository(other),
            })
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if it doesn't exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        if !self.categories.delete(id).await? {
            return Err(CatalogError::CategoryNotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products matching the filter, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if a query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), CatalogError> {
        Ok(self.products.list(filter).await?)
    }

    /// Get a product with its reviews.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if it doesn't exist.
    pub async fn get_product(
        &self,
        id: ProductId,
    ) -> Result<(Product, Vec<ProductReview>), CatalogError> {
        let product = self
            .products
            .get(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;
        let reviews = self.products.list_reviews(id).await?;

        Ok((product, reviews))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn create_product(&self, input: &CreateProductInput) -> Result<Product, CatalogError> {
        Ok(self.products.create(input).await?)
    }

    /// Update a product, reporting any strict price drop for fan-out.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if it doesn't exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<(Product, Option<PriceDrop>), CatalogError> {
        let before = self
            .products
            .get(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;

        let updated = self.products.update(id, input).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::ProductNotFound,
            other => CatalogError::Repository(other),
        })?;

        let drop = (updated.price < before.price).then(|| PriceDrop {
            product_id: updated.id,
            product_name: updated.name.clone(),
            old_price: before.price,
            new_price: updated.price,
        });

        Ok((updated, drop))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if it doesn't exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.products.delete(id).await? {
            return Err(CatalogError::ProductNotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Reviews & Alerts
    // =========================================================================

    /// Add a review for a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidRating` if the rating is outside 1..=5.
    /// Returns `CatalogError::ProductNotFound` if the product doesn't exist.
    /// Returns `CatalogError::DuplicateReview` if the user already reviewed
    /// it.
    pub async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<ProductReview, CatalogError> {
        if !(1..=5).contains(&rating) {
            return Err(CatalogError::InvalidRating);
        }

        if self.products.get(product_id).await?.is_none() {
            return Err(CatalogError::ProductNotFound);
        }

        self.products
            .add_review(product_id, user_id, rating, comment)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CatalogError::DuplicateReview,
                other => CatalogError::Repository(other),
            })
    }

    /// Subscribe to price drop alerts for a product.
    ///
    /// Logged-in callers fall back to their account email when none is
    /// given; guests must supply one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product doesn't exist.
    /// Returns `CatalogError::MissingEmail` if a guest supplied no email.
    /// Returns `CatalogError::DuplicateAlert` if already subscribed.
    pub async fn subscribe_alert(
        &self,
        product_id: ProductId,
        user_id: Option<UserId>,
        email: Option<&str>,
    ) -> Result<(), CatalogError> {
        if self.products.get(product_id).await?.is_none() {
            return Err(CatalogError::ProductNotFound);
        }

        let email = match (email, user_id) {
            (Some(raw), _) => Email::parse(raw)?,
            (None, Some(uid)) => self
                .users
                .get_by_id(uid)
                .await?
                .ok_or(CatalogError::UserNotFound)?
                .email,
            (None, None) => return Err(CatalogError::MissingEmail),
        };

        self.products
            .subscribe_alert(product_id, &email, user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CatalogError::DuplicateAlert,
                other => CatalogError::Repository(other),
            })
    }
}

/// Fan a price drop out to its subscribers on a background task.
///
/// Each send is independent: one failure is logged and the rest continue.
/// At most [`PRICE_DROP_SEND_CONCURRENCY`] sends are in flight at once.
pub fn dispatch_price_drop(pool: PgPool, notifier: Notifier, drop: PriceDrop) {
    tokio::spawn(async move {
        let products = ProductRepository::new(&pool);

        let subscribers = match products.alert_subscribers(drop.product_id).await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                tracing::error!(
                    product_id = %drop.product_id,
                    error = %e,
                    "Failed to load price alert subscribers"
                );
                return;
            }
        };

        if subscribers.is_empty() {
            return;
        }

        let total = subscribers.len();
        tracing::info!(
            product_id = %drop.product_id,
            subscribers = total,
            "Dispatching price drop notifications"
        );

        let mut sends: JoinSet<bool> = JoinSet::new();
        let mut delivered = 0_usize;

        for email in subscribers {
            while sends.len() >= PRICE_DROP_SEND_CONCURRENCY {
                if matches!(sends.join_next().await, Some(Ok(true))) {
                    delivered += 1;
                }
            }

            let notifier = notifier.clone();
            let product_name = drop.product_name.clone();
            let (old_price, new_price) = (drop.old_price, drop.new_price);

            sends.spawn(async move {
                match notifier
                    .send_price_drop(email.as_str(), &product_name, old_price, new_price)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(to = %email, error = %e, "Price drop email failed");
                        false
                    }
                }
            });
        }

        while let Some(result) = sends.join_next().await {
            if matches!(result, Ok(true)) {
                delivered += 1;
            }
        }

        tracing::info!(
            product_id = %drop.product_id,
            delivered,
            total,
            "Price drop dispatch finished"
        );
    });
}
