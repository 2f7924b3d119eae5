//! HTTP route handlers for the Verdura API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /auth/register              - Start registration (sends verification email)
//! POST /auth/verify-email          - Verify email and set password
//! POST /auth/login                 - Login, returns a JWT
//! POST /auth/forgot-password       - Send a password reset code
//! POST /auth/reset-password        - Reset password with the code
//! GET  /auth/me                    - Current user profile
//!
//! # Categories
//! GET    /categories               - List categories
//! POST   /categories               - Create category (admin)
//! GET    /categories/{id}          - Category detail
//! PUT    /categories/{id}          - Update category (admin)
//! DELETE /categories/{id}          - Delete category (admin)
//!
//! # Products
//! GET    /products                 - Product listing (filters + pagination)
//! POST   /products                 - Create product (admin)
//! GET    /products/{id}            - Product detail with reviews
//! PUT    /products/{id}            - Update product (admin)
//! DELETE /products/{id}            - Delete product (admin)
//! POST   /products/{id}/reviews    - Add a review (auth)
//! POST   /products/{id}/alert      - Subscribe to price drop alerts
//!
//! # Cart (requires auth)
//! GET    /cart                     - Current cart
//! POST   /cart/add                 - Add an item
//! POST   /cart/update              - Set an item's quantity
//! DELETE /cart/remove/{productId}  - Remove an item
//! DELETE /cart/clear               - Empty the cart
//!
//! # Orders (requires auth)
//! POST /orders                     - Cash-on-delivery checkout
//! POST /orders/create-payment      - Online checkout, opens a payment intent
//! POST /orders/verify-payment      - Confirm an online payment
//! GET  /orders/my-orders           - Caller's order history
//! GET  /orders/{id}                - Order detail (owner or admin)
//! PUT  /orders/{id}/cancel         - Cancel an unshipped order
//!
//! # Admin
//! GET  /orders/admin/all           - Every order
//! PUT  /orders/admin/{id}/status   - Move an order along fulfillment
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-email", post(auth::verify_email))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/me", get(auth::me))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/reviews", post(products::add_review))
        .route("/{id}/alert", post(products::subscribe_alert))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove/{productId}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

/// Create the order routes router.
///
/// Static segments win over `{id}`, so `/my-orders` and `/admin/...` never
/// collide with the detail route.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::checkout))
        .route("/create-payment", post(orders::create_payment))
        .route("/verify-payment", post(orders::verify_payment))
        .route("/my-orders", get(orders::my_orders))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", put(orders::cancel))
        .route("/admin/all", get(orders::admin_all))
        .route("/admin/{id}/status", put(orders::admin_update_status))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
}
