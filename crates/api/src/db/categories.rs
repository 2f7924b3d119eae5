//! Category repository for database operations.

use sqlx::PgPool;

use verdura_core::CategoryId;

use super::RepositoryError;
use crate::models::Category;

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at, updated_at
             FROM categories ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Get a category by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at, updated_at
             FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Create a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description, created_at, updated_at
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("category name already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(category)
    }

    /// Update a category's name, slug, and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            UPDATE categories
            SET name = $2, slug = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, description, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("category name already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        category.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// Products referencing it keep existing with their category cleared
    /// (the foreign key is `ON DELETE SET NULL`).
    ///
    /// # Returns
    ///
    /// Returns `true` if the category was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
