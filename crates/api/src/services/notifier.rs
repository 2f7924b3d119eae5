//! Outbound email notifier.
//!
//! Renders Askama HTML bodies and hands them to the configured delivery
//! endpoint as `{to, subject, html}`. Delivery failures never propagate into
//! request handlers: callers either spawn sends in the background or log
//! and move on.

use askama::Template;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use verdura_core::Money;

use crate::config::EmailConfig;
use crate::models::OrderView;

/// HTML template for the account verification email.
#[derive(Template)]
#[template(path = "email/verify_email.html")]
struct VerifyEmailHtml<'a> {
    verify_url: &'a str,
}

/// HTML template for the password reset OTP email.
#[derive(Template)]
#[template(path = "email/reset_otp.html")]
struct ResetOtpHtml<'a> {
    otp: &'a str,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a OrderView,
}

/// HTML template for the order status update email.
#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusHtml<'a> {
    order: &'a OrderView,
}

/// HTML template for the price drop email.
#[derive(Template)]
#[template(path = "email/price_drop.html")]
struct PriceDropHtml<'a> {
    product_name: &'a str,
    old_price: Money,
    new_price: Money,
    savings: Money,
    percentage: Decimal,
}

/// The exact payload the delivery endpoint accepts.
#[derive(Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Delivery endpoint returned an error response.
    #[error("delivery error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Client for the email delivery endpoint.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: String,
}

impl Notifier {
    /// Create a new notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Send the account verification email.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    pub async fn send_verification(&self, to: &str, verify_url: &str) -> Result<(), NotifierError> {
        let html = VerifyEmailHtml { verify_url }.render()?;
        self.deliver(to, "Verify your Verdura account", &html).await
    }

    /// Send the password reset OTP email.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    pub async fn send_reset_otp(&self, to: &str, otp: &str) -> Result<(), NotifierError> {
        let html = ResetOtpHtml { otp }.render()?;
        self.deliver(to, "Your Verdura password reset code", &html)
            .await
    }

    /// Send the order confirmation email.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order: &OrderView,
    ) -> Result<(), NotifierError> {
        let html = OrderConfirmationHtml { order }.render()?;
        let subject = format!("Order {} confirmed", order.order_number);
        self.deliver(to, &subject, &html).await
    }

    /// Send the order status update email.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    pub async fn send_order_status(&self, to: &str, order: &OrderView) -> Result<(), NotifierError> {
        let html = OrderStatusHtml { order }.render()?;
        let subject = format!("Order {} update: {}", order.order_number, order.status);
        self.deliver(to, &subject, &html).await
    }

    /// Send the price drop email.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    pub async fn send_price_drop(
        &self,
        to: &str,
        product_name: &str,
        old_price: Money,
        new_price: Money,
    ) -> Result<(), NotifierError> {
        let html = PriceDropHtml {
            product_name,
            old_price,
            new_price,
            savings: old_price - new_price,
            percentage: Money::percentage_drop(old_price, new_price),
        }
        .render()?;

        let subject = format!("Price drop: {product_name}");
        self.deliver(to, &subject, &html).await
    }

    async fn deliver(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifierError> {
        let payload = EmailPayload { to, subject, html };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(to = %to, subject = %subject, "Email dispatched");
        Ok(())
    }
}
