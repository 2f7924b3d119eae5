//! Stripe payment gateway client.
//!
//! Speaks the payment intents API over form-encoded HTTP. Only the two
//! operations the order workflow needs are implemented.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use verdura_core::UserId;

use super::{GatewayError, IntentStatus, PaymentGateway, PaymentIntent};

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Stripe payment intents client.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: SecretString,
    currency: String,
}

/// The subset of Stripe's intent object we read.
#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
    status: String,
}

impl StripeGateway {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        secret_key: SecretString,
        currency: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            secret_key,
            currency: currency.to_owned(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        user_id: UserId,
    ) -> Result<PaymentIntent, GatewayError> {
        let amount = amount_minor.to_string();
        let user = user_id.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", self.currency.as_str()),
            ("metadata[user_id]", user.as_str()),
        ];

        let response = self
            .client
            .post(format!("{BASE_URL}/payment_intents"))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            GatewayError::Parse("intent response missing client_secret".to_owned())
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let response = self
            .client
            .get(format!("{BASE_URL}/payment_intents/{intent_id}"))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(IntentStatus {
            id: intent.id,
            status: intent.status,
        })
    }
}
