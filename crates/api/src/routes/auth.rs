//! Authentication route handlers.
//!
//! Registration is a two-step flow: `/auth/register` emails a verification
//! link, and `/auth/verify-email` redeems the token while setting the
//! password. Successful verification and login both return a bearer token.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, mint_token};
use crate::models::UserProfile;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub email: String,
}

/// Email verification request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailInput {
    pub token: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordInput {
    pub email: String,
}

/// Password reset request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub email: String,
    pub otp: String,
    pub password: String,
}

/// Token plus profile, returned by login and verification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

// =============================================================================
// Handlers
// =============================================================================

/// Start registration: store the unverified account and email a verification
/// link pointing at the frontend.
#[instrument(skip(state, input))]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let (user, token) = auth.register(&input.email).await?;

    let verify_url = format!(
        "{}/verify-email?token={token}",
        state.config().frontend_url.trim_end_matches('/')
    );

    let notifier = state.notifier().clone();
    let to = user.email.into_inner();
    tokio::spawn(async move {
        if let Err(e) = notifier.send_verification(&to, &verify_url).await {
            tracing::warn!(error = %e, "Verification email failed");
        }
    });

    Ok(Json(json!({ "message": "Verification email sent" })))
}

/// Redeem a verification token, set the password, and log the user in.
#[instrument(skip(state, input))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(input): Json<VerifyEmailInput>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.verify_email(&input.token, &input.password).await?;

    issue_token(&state, user)
}

/// Log in with email and password.
#[instrument(skip(state, input))]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&input.email, &input.password).await?;

    issue_token(&state, user)
}

/// Email a short-lived password reset code.
#[instrument(skip(state, input))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordInput>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let (user, otp) = auth.forgot_password(&input.email).await?;

    let notifier = state.notifier().clone();
    let to = user.email.into_inner();
    tokio::spawn(async move {
        if let Err(e) = notifier.send_reset_otp(&to, &otp).await {
            tracing::warn!(error = %e, "Reset code email failed");
        }
    });

    Ok(Json(json!({ "message": "Reset code sent" })))
}

/// Redeem a reset code and set a new password.
#[instrument(skip(state, input))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordInput>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    auth.reset_password(&input.email, &input.otp, &input.password)
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}

/// The authenticated user's profile.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserProfile>> {
    let auth = AuthService::new(state.pool());
    let user = auth.get_user(user.id).await?;

    Ok(Json(UserProfile::from(&user)))
}

/// Mint a bearer token for the user and wrap it with their profile.
fn issue_token(state: &AppState, user: crate::models::User) -> Result<Json<AuthResponse>> {
    let config = state.config();
    let token = mint_token(user.id, user.role, &config.jwt_secret, config.jwt_expiry_hours)
        .map_err(|e| AppError::Internal(format!("failed to mint token: {e}")))?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}
