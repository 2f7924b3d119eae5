//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (frontend origin only)
//!
//! Authentication is not a layer: handlers opt in through the extractors
//! in [`auth`].

pub mod auth;

pub use auth::{AuthUser, Claims, OptionalAuth, RequireAdmin, RequireAuth, mint_token};
