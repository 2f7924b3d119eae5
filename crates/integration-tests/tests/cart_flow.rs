//! Integration tests for the shopping cart.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//!   (cargo run -p verdura-cli -- migrate)
//! - The API server running (cargo run -p verdura-api)
//! - An admin account, created with: cargo run -p verdura-cli -- admin create
//!   (credentials via `VERDURA_TEST_ADMIN_EMAIL` / `VERDURA_TEST_ADMIN_PASSWORD`)
//!
//! Run with: cargo test -p verdura-integration-tests -- --ignored

#![allow(clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use verdura_integration_tests::TestContext;

/// Test helper: seed a product with the given stock, returning its ID.
async fn seed_product(ctx: &TestContext, name: &str, price: &str, stock: i32) -> i64 {
    let admin = ctx.admin_token().await;

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .bearer_auth(&admin)
        .json(&json!({
            "name": format!("{name} {}", Uuid::new_v4()),
            "price": price,
            "stock": stock,
            "unit": "kg",
        }))
        .send()
        .await
        .expect("Failed to create product");

    assert_eq!(resp.status(), StatusCode::OK);
    let product: Value = resp.json().await.expect("Failed to parse product");
    product["id"].as_i64().expect("product id")
}

/// Test helper: a fresh customer token.
async fn fresh_customer(ctx: &TestContext) -> String {
    ctx.register_and_login(&TestContext::unique_email("cart"), "cart-password")
        .await
}

// ============================================================================
// Basic Cart Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cart_starts_empty() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;

    let resp = ctx
        .client
        .get(ctx.url("/cart"))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to get cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert!(cart["id"].is_i64());
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_add_merges_existing_line() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Mergeable Carrot", "1.20", 50).await;

    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to add to cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["items"][0]["unitPrice"], "1.20");

    // Adding the same product again merges into one line
    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 3 }))
        .send()
        .await
        .expect("Failed to add to cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], 5);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_add_beyond_stock_rejected() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Scarce Truffle", "30.00", 5).await;

    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 6 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "insufficient stock: only 5 available");

    // Merging past the stock ceiling is also rejected
    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 3 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 3 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_update_sets_absolute_quantity() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Adjustable Potato", "0.80", 30).await;

    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    // Update is absolute, not additive
    let resp = ctx
        .client
        .post(ctx.url("/cart/update"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 7 }))
        .send()
        .await
        .expect("Failed to update cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"][0]["quantity"], 7);

    // Zero is not a valid quantity; removal is a separate endpoint
    let resp = ctx
        .client
        .post(ctx.url("/cart/update"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_update_missing_line_not_found() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Never-Added Fennel", "2.00", 10).await;

    let resp = ctx
        .client
        .post(ctx.url("/cart/update"))
        .bearer_auth(&customer)
        .json(&json!({ "productId": product_id, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "item not in cart");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_remove_and_clear() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let first = seed_product(&ctx, "Keepable Onion", "0.60", 20).await;
    let second = seed_product(&ctx, "Removable Garlic", "0.90", 20).await;

    for id in [first, second] {
        let resp = ctx
            .client
            .post(ctx.url("/cart/add"))
            .bearer_auth(&customer)
            .json(&json!({ "productId": id, "quantity": 1 }))
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Remove one line
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/cart/remove/{second}")))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to remove from cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["productId"].as_i64(), Some(first));

    // Clear the rest
    let resp = ctx
        .client
        .delete(ctx.url("/cart/clear"))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to clear cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
}

// ============================================================================
// Authorization Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cart_requires_auth() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/cart"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .json(&json!({ "productId": 1, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_carts_are_per_user() {
    let ctx = TestContext::new().await;
    let alice = fresh_customer(&ctx).await;
    let bob = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Private Radish", "1.10", 10).await;

    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .bearer_auth(&alice)
        .json(&json!({ "productId": product_id, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    // Bob's cart is untouched
    let resp = ctx
        .client
        .get(ctx.url("/cart"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to get cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
}
