//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] verdura_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email already belongs to a verified account.
    #[error("account already exists")]
    AlreadyVerified,

    /// Login attempted before email verification.
    #[error("email not verified")]
    EmailNotVerified,

    /// Verification token unknown.
    #[error("invalid verification token")]
    InvalidToken,

    /// Verification token past its expiry.
    #[error("verification token expired")]
    TokenExpired,

    /// Reset OTP wrong or unknown.
    #[error("invalid reset code")]
    InvalidOtp,

    /// Reset OTP past its expiry.
    #[error("reset code expired")]
    OtpExpired,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
