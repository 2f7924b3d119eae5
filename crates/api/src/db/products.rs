//! Product, review, and price alert repository for database operations.

use sqlx::PgPool;

use verdura_core::{Email, ProductId, UserId};

use super::RepositoryError;
use crate::models::{CreateProductInput, Product, ProductFilter, ProductReview, UpdateProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, price, original_price, category_id, \
     stock, unit, images, rating, num_reviews, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the filter, newest first, with the total count
    /// of matching rows (for pagination).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let category = filter.category_id.map(|id| id.as_i64());
        let search = filter.search.as_deref();

        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::BIGINT IS NULL OR category_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(category)
        .bind(search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM products
            WHERE ($1::BIGINT IS NULL OR category_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
            ",
        )
        .bind(category)
        .bind(search)
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get several products at once. Missing IDs are silently absent from
    /// the result; callers detect them by comparing lengths.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (name, description, price, original_price, category_id, stock, unit, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.original_price)
        .bind(input.category_id)
        .bind(input.stock)
        .bind(&input.unit)
        .bind(&input.images)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Update the fields provided in the input, leaving the rest unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                original_price = COALESCE($5, original_price),
                category_id = COALESCE($6, category_id),
                stock = COALESCE($7, stock),
                unit = COALESCE($8, unit),
                images = COALESCE($9, images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.original_price)
        .bind(input.category_id)
        .bind(input.stock)
        .bind(input.unit.as_deref())
        .bind(input.images.as_deref())
        .fetch_optional(self.pool)
        .await?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a review and refresh the product's denormalized rating stats
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed this
    /// product. Returns `RepositoryError::Database` for other database errors.
    pub async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<ProductReview, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, ProductReview>(
            r"
            INSERT INTO product_reviews (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, rating, comment, created_at
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("product already reviewed".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        sqlx::query(
            r"
            UPDATE products
            SET rating = COALESCE((SELECT AVG(rating) FROM product_reviews WHERE product_id = $1), 0),
                num_reviews = (SELECT COUNT(*)::INT FROM product_reviews WHERE product_id = $1),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(review)
    }

    /// List reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_reviews(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductReview>, RepositoryError> {
        let reviews = sqlx::query_as::<_, ProductReview>(
            r"
            SELECT id, product_id, user_id, rating, comment, created_at
            FROM product_reviews
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Subscribe an email address to price drop alerts for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email (or the user, when
    /// logged in) is already subscribed. Returns `RepositoryError::Database`
    /// for other database errors.
    pub async fn subscribe_alert(
        &self,
        product_id: ProductId,
        email: &Email,
        user_id: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        if let Some(uid) = user_id {
            let already: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM price_alerts WHERE product_id = $1 AND user_id = $2)",
            )
            .bind(product_id)
            .bind(uid)
            .fetch_one(self.pool)
            .await?;

            if already {
                return Err(RepositoryError::Conflict(
                    "already subscribed to price alerts".to_owned(),
                ));
            }
        }

        // Unique (product_id, email) index backstops the guest path.
        let result = sqlx::query(
            r"
            INSERT INTO price_alerts (product_id, user_id, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, email) DO NOTHING
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(email.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "already subscribed to price alerts".to_owned(),
            ));
        }

        Ok(())
    }

    /// All email addresses subscribed to price alerts for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn alert_subscribers(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Email>, RepositoryError> {
        let emails = sqlx::query_scalar::<_, Email>(
            "SELECT email FROM price_alerts WHERE product_id = $1 ORDER BY created_at ASC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(emails)
    }
}
