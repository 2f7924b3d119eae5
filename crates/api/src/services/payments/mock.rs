//! Mock payment gateway for development.
//!
//! Mints plausible-looking intent IDs and reports every intent as
//! succeeded, so the full checkout flow can be exercised without Stripe
//! credentials.

use async_trait::async_trait;
use rand::Rng;

use verdura_core::UserId;

use super::{GatewayError, INTENT_STATUS_SUCCEEDED, IntentStatus, PaymentGateway, PaymentIntent};

/// Gateway that approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockGateway;

impl MockGateway {
    /// Create a new mock gateway.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        _amount_minor: i64,
        _user_id: UserId,
    ) -> Result<PaymentIntent, GatewayError> {
        let token: u64 = rand::rng().random();
        let id = format!("pi_mock_{token:016x}");
        let client_secret = format!("{id}_secret_{:08x}", rand::rng().random::<u32>());

        Ok(PaymentIntent { id, client_secret })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        Ok(IntentStatus {
            id: intent_id.to_owned(),
            status: INTENT_STATUS_SUCCEEDED.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_intent_ids_look_like_stripe_ids() {
        let gateway = MockGateway::new();
        let intent = gateway.create_intent(3250, UserId::new(1)).await.unwrap();

        assert!(intent.id.starts_with("pi_mock_"));
        assert!(intent.client_secret.starts_with(&intent.id));
    }

    #[tokio::test]
    async fn test_intent_ids_are_unique() {
        let gateway = MockGateway::new();
        let a = gateway.create_intent(100, UserId::new(1)).await.unwrap();
        let b = gateway.create_intent(100, UserId::new(1)).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_every_intent_reports_succeeded() {
        let gateway = MockGateway::new();
        let status = gateway.retrieve_intent("pi_mock_anything").await.unwrap();

        assert_eq!(status.status, INTENT_STATUS_SUCCEEDED);
        assert_eq!(status.id, "pi_mock_anything");
    }
}
