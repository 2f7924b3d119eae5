//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use url::Url;

use crate::config::ApiConfig;
use crate::services::notifier::{Notifier, NotifierError};
use crate::services::payments::{GatewayError, PaymentGateway, create_gateway};

/// Error assembling application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid frontend URL: {0}")]
    InvalidFrontendUrl(#[from] url::ParseError),
    #[error("payment gateway: {0}")]
    Gateway(#[from] GatewayError),
    #[error("email notifier: {0}")]
    Notifier(#[from] NotifierError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the frontend URL doesn't parse, or if the gateway
    /// or notifier clients cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        // Fail startup on an unparseable frontend URL rather than minting
        // broken links in every email.
        Url::parse(&config.frontend_url)?;

        let gateway = create_gateway(&config.gateway)?;
        let notifier = Notifier::new(&config.email)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                gateway,
                notifier,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a handle to the configured payment gateway.
    #[must_use]
    pub fn gateway(&self) -> Arc<dyn PaymentGateway> {
        Arc::clone(&self.inner.gateway)
    }

    /// Get a reference to the email notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}
