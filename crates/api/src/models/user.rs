//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdura_core::{Email, UserId, UserRole};

/// A registered shopper or admin.
///
/// The password hash is `None` until the user completes email verification,
/// which is also the step that sets their initial password.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (stored lowercase).
    pub email: Email,
    /// Argon2 password hash, absent until verification completes.
    pub password_hash: Option<String>,
    /// Role used for authorization decisions.
    pub role: UserRole,
    /// Whether the email has been verified.
    pub is_verified: bool,
    /// Pending email verification token, if one is outstanding.
    pub verification_token: Option<String>,
    /// When the verification token expires.
    pub verification_expires_at: Option<DateTime<Utc>>,
    /// Pending password reset OTP, if one is outstanding.
    pub reset_otp: Option<String>,
    /// When the reset OTP expires.
    pub reset_otp_expires_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user, safe to return from the API.
///
/// Never includes the password hash or any pending tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}
