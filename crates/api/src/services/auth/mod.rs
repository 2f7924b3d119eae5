//! Authentication service.
//!
//! Registration is verify-first: a new account starts unverified with a
//! one-time token, and the password is only set when the token is redeemed.
//! Password resets use a short-lived six-digit OTP delivered by email.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;

use verdura_core::{Email, UserId};

use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a verification token stays redeemable.
const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// How long a password reset OTP stays redeemable.
const RESET_OTP_TTL_MINUTES: i64 = 10;

/// Authentication service.
///
/// Handles registration, email verification, login, and password resets.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration & Verification
    // =========================================================================

    /// Register an email address, returning the user and the verification
    /// token to mail to them.
    ///
    /// Re-registering an unverified email issues a fresh token; the old one
    /// stops working.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::AlreadyVerified` if the email belongs to a
    /// verified account.
    pub async fn register(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let token = generate_verification_token();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

        let user = self
            .users
            .upsert_unverified(&email, &token, expires_at)
            .await?
            .ok_or(AuthError::AlreadyVerified)?;

        Ok((user, token))
    }

    /// Redeem a verification token, setting the account's password and
    /// marking it verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown.
    /// Returns `AuthError::TokenExpired` if the token is past its expiry.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet
    /// requirements.
    pub async fn verify_email(&self, token: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_verification_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let expires_at = user.verification_expires_at.ok_or(AuthError::InvalidToken)?;
        if expires_at < Utc::now() {
            return Err(AuthError::TokenExpired);
        }

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .set_password_and_verify(user.id, &password_hash)
            .await?;

        Ok(user)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is
    /// wrong, without revealing which. Returns `AuthError::EmailNotVerified`
    /// if the account exists but was never verified.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Start a password reset, returning the user and the OTP to mail to
    /// them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    pub async fn forgot_password(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let otp = generate_reset_otp();
        let expires_at = Utc::now() + Duration::minutes(RESET_OTP_TTL_MINUTES);

        self.users.set_reset_otp(user.id, &otp, expires_at).await?;

        Ok((user, otp))
    }

    /// Complete a password reset with the emailed OTP.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    /// Returns `AuthError::InvalidOtp` if the OTP doesn't match.
    /// Returns `AuthError::OtpExpired` if the OTP is past its expiry.
    /// Returns `AuthError::WeakPassword` if the new password doesn't meet
    /// requirements.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.reset_otp.as_deref() != Some(otp) {
            return Err(AuthError::InvalidOtp);
        }

        let expires_at = user.reset_otp_expires_at.ok_or(AuthError::InvalidOtp)?;
        if expires_at < Utc::now() {
            return Err(AuthError::OtpExpired);
        }

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        self.users.reset_password(user.id, &password_hash).await?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a URL-safe verification token (32 random bytes).
fn generate_verification_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a 6-digit password reset OTP.
fn generate_reset_otp() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}
