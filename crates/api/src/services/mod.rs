//! Business logic services for the Verdura API.
//!
//! # Services
//!
//! - `auth` - Registration, email verification, login, password reset
//! - `cart` - Cart contents and stock-checked mutations
//! - `catalog` - Categories, products, reviews, and price alerts
//! - `notifier` - Transactional email rendering and delivery
//! - `orders` - Checkout, payment verification, cancellation, fulfillment
//! - `payments` - Payment gateway abstraction (Stripe or mock)

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod notifier;
pub mod orders;
pub mod payments;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService, PriceDrop, dispatch_price_drop};
pub use notifier::{Notifier, NotifierError};
pub use orders::{OnlineCheckout, OrderError, OrderService};
pub use payments::{GatewayError, PaymentGateway, create_gateway};
