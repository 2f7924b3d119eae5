//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use verdura_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, role, is_verified, \
     verification_token, verification_expires_at, reset_otp, reset_otp_expires_at, \
     created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create an unverified user, or refresh the verification token if one
    /// already exists and has not verified yet.
    ///
    /// Returns `None` when the email belongs to an already-verified account,
    /// so registration can be rejected without a separate lookup racing the
    /// insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_unverified(
        &self,
        email: &Email,
        verification_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO users (email, verification_token, verification_expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
                SET verification_token = EXCLUDED.verification_token,
                    verification_expires_at = EXCLUDED.verification_expires_at,
                    updated_at = NOW()
                WHERE users.is_verified = FALSE
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(verification_token)
        .bind(expires_at)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by an outstanding verification token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE verification_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Set the user's password and mark them verified, clearing the
    /// verification token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password_and_verify(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE users
            SET password_hash = $2,
                is_verified = TRUE,
                verification_token = NULL,
                verification_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?;

        user.ok_or(RepositoryError::NotFound)
    }

    /// Store a password reset OTP and its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_reset_otp(
        &self,
        id: UserId,
        otp: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET reset_otp = $2, reset_otp_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(otp)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace the user's password and clear the reset OTP.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn reset_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $2,
                reset_otp = NULL,
                reset_otp_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
