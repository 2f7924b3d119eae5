//! Integration test support for Verdura.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations, then start the API with the mock payment gateway
//! cargo run -p verdura-cli -- migrate
//! VERDURA_PAYMENT_GATEWAY=mock cargo run -p verdura-api
//!
//! # Run the integration tests against it
//! cargo test -p verdura-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `VERDURA_API_URL` - Base URL of the running API
//!   (default `http://localhost:5000`)
//! - `VERDURA_DATABASE_URL` - `PostgreSQL` connection string. Tests read
//!   verification tokens and reset codes directly from the database, since
//!   the API only ever delivers them by email.
//! - `VERDURA_TEST_ADMIN_EMAIL` / `VERDURA_TEST_ADMIN_PASSWORD` - Credentials
//!   for an admin account, created beforehand with
//!   `verdura-cli admin create`.

#![allow(clippy::missing_panics_doc)]

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Body of a successful login or verify-email response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: serde_json::Value,
}

/// Shared context for tests that drive the HTTP API.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the configured API and database.
    pub async fn new() -> Self {
        let base_url = std::env::var("VERDURA_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());

        let database_url = std::env::var("VERDURA_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("VERDURA_DATABASE_URL must be set for integration tests");

        let client = Client::new();
        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to database");

        Self {
            client,
            base_url,
            pool,
        }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// An email address no other test run has used.
    #[must_use]
    pub fn unique_email(prefix: &str) -> String {
        format!("{prefix}-{}@verdura.test", Uuid::new_v4())
    }

    /// Register a fresh account, verify it with the token read from the
    /// database, and return the bearer token.
    pub async fn register_and_login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("register request failed");
        assert!(
            resp.status().is_success(),
            "register failed: {}",
            resp.status()
        );

        let token = self.verification_token(email).await;

        let resp = self
            .client
            .post(self.url("/auth/verify-email"))
            .json(&json!({ "token": token, "password": password }))
            .send()
            .await
            .expect("verify request failed");
        assert!(
            resp.status().is_success(),
            "verify failed: {}",
            resp.status()
        );

        let auth: AuthResponse = resp.json().await.expect("verify response was not JSON");
        auth.token
    }

    /// Log in an existing, verified account and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        assert!(
            resp.status().is_success(),
            "login failed for {email}: {}",
            resp.status()
        );

        let auth: AuthResponse = resp.json().await.expect("login response was not JSON");
        auth.token
    }

    /// Bearer token for the admin account used by admin tests.
    pub async fn admin_token(&self) -> String {
        let email = std::env::var("VERDURA_TEST_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@verdura.test".to_string());
        let password = std::env::var("VERDURA_TEST_ADMIN_PASSWORD")
            .unwrap_or_else(|_| "integration-admin".to_string());

        self.login(&email, &password).await
    }

    /// The account's pending email verification token.
    pub async fn verification_token(&self, email: &str) -> String {
        let token: Option<String> =
            sqlx::query_scalar("SELECT verification_token FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .expect("user row not found");

        token.expect("no verification token outstanding")
    }

    /// The account's pending password reset code.
    pub async fn reset_otp(&self, email: &str) -> String {
        let otp: Option<String> =
            sqlx::query_scalar("SELECT reset_otp FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .expect("user row not found");

        otp.expect("no reset code outstanding")
    }
}
