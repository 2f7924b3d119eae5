//! Payment gateway abstraction.
//!
//! The order workflow never talks to a concrete provider: it holds an
//! `Arc<dyn PaymentGateway>` chosen from configuration at startup.
//! Production uses Stripe; development uses a mock that reports every
//! intent as succeeded.

mod mock;
mod stripe;

pub use mock::MockGateway;
pub use stripe::StripeGateway;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use verdura_core::UserId;

use crate::config::{GatewayConfig, GatewayMode};

/// Status string a gateway reports once a payment has settled. Anything
/// else means the money has not been captured.
pub const INTENT_STATUS_SUCCEEDED: &str = "succeeded";

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("gateway API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a gateway response.
    #[error("failed to parse gateway response: {0}")]
    Parse(String),

    /// Gateway is misconfigured.
    #[error("gateway misconfigured: {0}")]
    Config(String),
}

/// A freshly created payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Gateway-assigned intent ID (e.g., `pi_...`).
    pub id: String,
    /// Secret the frontend uses to confirm the payment.
    pub client_secret: String,
}

/// Current state of an existing intent.
#[derive(Debug, Clone)]
pub struct IntentStatus {
    pub id: String,
    pub status: String,
}

/// Remote payment provider operations the order workflow depends on.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_minor` in the currency's
    /// smallest unit (e.g., cents). The user ID travels as metadata for
    /// reconciliation.
    async fn create_intent(
        &self,
        amount_minor: i64,
        user_id: UserId,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Fetch the current status of an intent.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<IntentStatus, GatewayError>;
}

/// Build the gateway selected by configuration.
///
/// # Errors
///
/// Returns `GatewayError::Config` if Stripe is selected without a secret
/// key, or `GatewayError::Http` if the HTTP client cannot be built.
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
    match config.mode {
        GatewayMode::Mock => Ok(Arc::new(MockGateway::new())),
        GatewayMode::Stripe => {
            let secret_key = config.secret_key.clone().ok_or_else(|| {
                GatewayError::Config("stripe selected but no secret key configured".to_owned())
            })?;

            let gateway = StripeGateway::new(
                secret_key,
                &config.currency,
                Duration::from_secs(config.timeout_secs),
            )?;

            Ok(Arc::new(gateway))
        }
    }
}
