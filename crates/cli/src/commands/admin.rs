//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin user
//! verdura-cli admin create -e admin@verdura.shop -p "a strong password"
//! ```
//!
//! # Environment Variables
//!
//! - `VERDURA_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use verdura_core::{Email, UserRole};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] verdura_core::EmailError),

    /// Password fails the minimum length rule.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Password hashing failed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Create a new admin user.
///
/// The account is created verified with the given password, so it can log
/// in immediately without the email verification flow.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `password` - Admin's password (min 8 characters)
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error if validation fails, the email is already taken, or a
/// database operation fails.
pub async fn create_user(email: &str, password: &str) -> Result<i64, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)?;

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let database_url = std::env::var("VERDURA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AdminError::MissingEnvVar("VERDURA_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin user: {}", email);

    // Check if user already exists
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(AdminError::UserExists(email.as_str().to_owned()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AdminError::PasswordHash)?
        .to_string();

    let user_id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO users (email, password_hash, role, is_verified)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user_id,
        email
    );

    Ok(user_id)
}
