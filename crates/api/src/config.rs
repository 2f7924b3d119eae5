//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VERDURA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `VERDURA_FRONTEND_URL` - Public URL of the React storefront (CORS origin, email links)
//! - `VERDURA_JWT_SECRET` - JWT signing secret (min 32 chars, high entropy)
//! - `VERDURA_EMAIL_ENDPOINT` - HTTP endpoint that delivers transactional email
//! - `STRIPE_SECRET_KEY` - Stripe API key (only when `VERDURA_PAYMENT_GATEWAY=stripe`)
//!
//! ## Optional
//! - `VERDURA_HOST` - Bind address (default: 127.0.0.1)
//! - `VERDURA_PORT` - Listen port (default: 5000)
//! - `VERDURA_JWT_EXPIRY_HOURS` - Token lifetime (default: 720)
//! - `VERDURA_PAYMENT_GATEWAY` - `mock` or `stripe` (default: mock)
//! - `VERDURA_CURRENCY` - ISO currency code for charges (default: usd)
//! - `VERDURA_GATEWAY_TIMEOUT_SECS` - Gateway HTTP timeout (default: 10)
//! - `VERDURA_EMAIL_TIMEOUT_SECS` - Email endpoint HTTP timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the frontend, for CORS and links in emails
    pub frontend_url: String,
    /// JWT signing secret
    pub jwt_secret: SecretString,
    /// How long issued tokens stay valid
    pub jwt_expiry_hours: i64,
    /// Payment gateway configuration
    pub gateway: GatewayConfig,
    /// Transactional email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry error event sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry performance tracing sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Which payment gateway implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    /// In-process mock that approves everything. Development only.
    Mock,
    /// Real Stripe `PaymentIntents` API.
    Stripe,
}

/// Payment gateway configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Which gateway implementation to run
    pub mode: GatewayMode,
    /// Gateway API secret key (required for Stripe)
    pub secret_key: Option<SecretString>,
    /// ISO currency code charges are made in
    pub currency: String,
    /// HTTP timeout for gateway calls, in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("mode", &self.mode)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("currency", &self.currency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Transactional email delivery configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// HTTP endpoint that accepts `{to, subject, html}` payloads
    pub endpoint: String,
    /// HTTP timeout for delivery calls, in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("VERDURA_DATABASE_URL")?;
        let host = get_env_or_default("VERDURA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("VERDURA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("VERDURA_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("VERDURA_PORT".to_string(), e.to_string()))?;
        let frontend_url = get_required_env("VERDURA_FRONTEND_URL")?;

        let jwt_secret = get_validated_secret("VERDURA_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "VERDURA_JWT_SECRET")?;
        let jwt_expiry_hours = get_env_or_default("VERDURA_JWT_EXPIRY_HOURS", "720")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("VERDURA_JWT_EXPIRY_HOURS".to_string(), e.to_string())
            })?;

        let gateway = GatewayConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            jwt_secret,
            jwt_expiry_hours,
            gateway,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mode = match get_env_or_default("VERDURA_PAYMENT_GATEWAY", "mock").as_str() {
            "mock" => GatewayMode::Mock,
            "stripe" => GatewayMode::Stripe,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "VERDURA_PAYMENT_GATEWAY".to_string(),
                    format!("expected 'mock' or 'stripe', got '{other}'"),
                ));
            }
        };

        // The key is only read in stripe mode, so a dev box with mock
        // selected never needs one set.
        let secret_key = match mode {
            GatewayMode::Stripe => Some(get_validated_secret("STRIPE_SECRET_KEY")?),
            GatewayMode::Mock => None,
        };

        let timeout_secs = get_env_or_default("VERDURA_GATEWAY_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "VERDURA_GATEWAY_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        Ok(Self {
            mode,
            secret_key,
            currency: get_env_or_default("VERDURA_CURRENCY", "usd"),
            timeout_secs,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default("VERDURA_EMAIL_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("VERDURA_EMAIL_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            endpoint: get_required_env("VERDURA_EMAIL_ENDPOINT")?,
            timeout_secs,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by managed
/// Postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the JWT secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_jwt_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_jwt_secret(&secret, "TEST_JWT");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_jwt_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_jwt_secret(&secret, "TEST_JWT");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_secret: SecretString::from("x".repeat(32)),
            jwt_expiry_hours: 720,
            gateway: GatewayConfig {
                mode: GatewayMode::Mock,
                secret_key: None,
                currency: "usd".to_string(),
                timeout_secs: 10,
            },
            email: EmailConfig {
                endpoint: "http://localhost:8025/send".to_string(),
                timeout_secs: 10,
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_gateway_config_debug_redacts_secret() {
        let config = GatewayConfig {
            mode: GatewayMode::Stripe,
            secret_key: Some(SecretString::from("sk_live_very_sensitive_value")),
            currency: "usd".to_string(),
            timeout_secs: 10,
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("Stripe"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_very_sensitive_value"));
    }
}
