//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Responses are JSON `{"message": ...}` bodies so the
//! frontend can surface them directly.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::catalog::CatalogError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is the server's fault rather than the client's.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Cart(err) => matches!(err, CartError::Repository(_)),
            Self::Catalog(err) => matches!(err, CatalogError::Repository(_)),
            Self::Order(err) => matches!(
                err,
                OrderError::Repository(_) | OrderError::TotalOutOfRange | OrderError::Gateway(_)
            ),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::AlreadyVerified => StatusCode::CONFLICT,
                AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::InvalidOtp
                | AuthError::OtpExpired
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::ItemNotFound => StatusCode::NOT_FOUND,
                CartError::InsufficientStock { .. } | CartError::InvalidQuantity => {
                    StatusCode::BAD_REQUEST
                }
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::CategoryNotFound
                | CatalogError::ProductNotFound
                | CatalogError::UserNotFound => StatusCode::NOT_FOUND,
                CatalogError::CategoryExists
                | CatalogError::DuplicateReview
                | CatalogError::DuplicateAlert => StatusCode::CONFLICT,
                CatalogError::InvalidRating
                | CatalogError::MissingEmail
                | CatalogError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::NotFound
                | OrderError::UserNotFound
                | OrderError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Forbidden => StatusCode::FORBIDDEN,
                OrderError::AlreadyPaid => StatusCode::CONFLICT,
                OrderError::EmptyOrder
                | OrderError::InvalidQuantity
                | OrderError::OutOfStock { .. }
                | OrderError::BelowMinimum { .. }
                | OrderError::IntentMismatch
                | OrderError::PaymentNotSucceeded { .. }
                | OrderError::NotCancellable { .. }
                | OrderError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderError::Gateway(_) => StatusCode::BAD_GATEWAY,
                OrderError::Repository(_) | OrderError::TotalOutOfRange => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leak here.
    fn message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Cart(err) => match err {
                CartError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Catalog(err) => match err {
                CatalogError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Order(err) => match err {
                OrderError::Repository(_) | OrderError::TotalOutOfRange => {
                    "Internal server error".to_string()
                }
                OrderError::Gateway(_) => "Payment gateway error".to_string(),
                other => other.to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "message": self.message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
