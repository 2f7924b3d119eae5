//! Authentication extractors and JWT handling.
//!
//! Tokens are stateless: the claims carry everything a handler needs (user
//! ID and role), there is no session table, and a token stays valid until
//! its fixed expiry. Logout is purely client-side.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use verdura_core::{UserId, UserRole};

use crate::state::AppState;

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i64,
    /// Role at issue time.
    pub role: UserRole,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// The authenticated caller, as decoded from their token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
    pub role: UserRole,
}

/// Sign a token for a user.
///
/// # Errors
///
/// Returns an error if signing fails.
pub fn mint_token(
    user_id: UserId,
    role: UserRole,
    secret: &SecretString,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_i64(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
}

/// Decode and validate a token, including its expiry.
///
/// # Errors
///
/// Returns an error if the signature is invalid or the token has expired.
pub fn decode_token(
    token: &str,
    secret: &SecretString,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    )?;

    Ok(data.claims)
}

/// Error returned when a request fails authentication.
#[derive(Debug)]
pub enum AuthRejection {
    /// No bearer token in the Authorization header.
    MissingToken,
    /// Token present but invalid or expired.
    InvalidToken,
    /// Valid token, but the caller is not an admin.
    NotAdmin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            Self::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AuthRejection> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthRejection::MissingToken)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::MissingToken)?;

    let claims = decode_token(token, &state.config().jwt_secret)
        .map_err(|_| AuthRejection::InvalidToken)?;

    Ok(AuthUser {
        id: UserId::new(claims.sub),
        role: claims.role,
    })
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("user {}", user.id)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token with the admin role.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;

        if user.role != UserRole::Admin {
            return Err(AuthRejection::NotAdmin);
        }

        Ok(Self(user))
    }
}

/// Extractor that accepts but does not require a bearer token.
///
/// Unlike `RequireAuth`, this never rejects: a missing or invalid token
/// simply yields `None`.
pub struct OptionalAuth(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).ok()))
    }
}
