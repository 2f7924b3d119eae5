//! Integration tests for checkout, payment, and the order lifecycle.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//!   (cargo run -p verdura-cli -- migrate)
//! - The API server running with the mock payment gateway
//!   (VERDURA_PAYMENT_GATEWAY=mock cargo run -p verdura-api)
//! - An admin account, created with: cargo run -p verdura-cli -- admin create
//!   (credentials via `VERDURA_TEST_ADMIN_EMAIL` / `VERDURA_TEST_ADMIN_PASSWORD`)
//!
//! Run with: cargo test -p verdura-integration-tests -- --ignored

#![allow(clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use verdura_integration_tests::TestContext;

/// Test helper: seed a product with the given price and stock, returning
/// its ID.
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
    ctx.register_and_login(&TestContext::unique_email("orders"), "orders-password")
        .await
}

/// Test helper: a plausible delivery address.
fn shipping_address() -> Value {
    json!({
        "fullName": "Test Customer",
        "address": "12 Allotment Lane",
        "city": "Springfield",
        "postalCode": "90210",
        "country": "US",
        "phone": "+1 555 0100",
    })
}

/// Test helper: place a cash-on-delivery order for one product.
async fn place_cod_order(ctx: &TestContext, token: &str, product_id: i64, quantity: i32) -> Value {
    let resp = ctx
        .client
        .post(ctx.url("/orders"))
        .bearer_auth(token)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": quantity }],
            "shippingAddress": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to place order");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse order")
}

/// Test helper: current stock as seen by the public detail endpoint.
async fn current_stock(ctx: &TestContext, product_id: i64) -> i64 {
    let resp = ctx
        .client
        .get(ctx.url(&format!("/products/{product_id}")))
        .send()
        .await
        .expect("Failed to get product");

    assert_eq!(resp.status(), StatusCode::OK);
    let product: Value = resp.json().await.expect("Failed to parse product");
    product["stock"].as_i64().expect("stock")
}

// ============================================================================
// Cash-on-Delivery Checkout Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cod_checkout_computes_totals() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Checkout Squash", "10.00", 50).await;

    let order = place_cod_order(&ctx, &customer, product_id, 2).await;

    let order_number = order["orderNumber"].as_str().expect("order number");
    assert!(order_number.starts_with("ORD-"));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentMethod"], "cod");
    assert_eq!(order["paymentStatus"], "pending");

    // 20.00 + 10% tax + flat shipping below the free threshold
    assert_eq!(order["subtotal"], "20.00");
    assert_eq!(order["tax"], "2.00");
    assert_eq!(order["shippingCost"], "5.00");
    assert_eq!(order["totalAmount"], "27.00");

    // Lines are snapshots with the price frozen at checkout
    assert_eq!(order["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(order["items"][0]["unitPrice"], "10.00");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["shippingAddress"]["fullName"], "Test Customer");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_free_shipping_above_threshold() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Bulk Walnuts", "30.00", 50).await;

    let order = place_cod_order(&ctx, &customer, product_id, 2).await;

    assert_eq!(order["subtotal"], "60.00");
    assert_eq!(order["tax"], "6.00");
    assert_eq!(order["shippingCost"], "0.00");
    assert_eq!(order["totalAmount"], "66.00");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_rejects_empty_items() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;

    let resp = ctx
        .client
        .post(ctx.url("/orders"))
        .bearer_auth(&customer)
        .json(&json!({ "items": [], "shippingAddress": shipping_address() }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "order must contain at least one item");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_beyond_stock_rejected() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Scarce Saffron", "25.00", 3).await;

    let resp = ctx
        .client
        .post(ctx.url("/orders"))
        .bearer_auth(&customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 4 }],
            "shippingAddress": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    let message = body["message"].as_str().expect("message string");
    assert!(message.contains("insufficient stock"));
    assert!(message.contains("only 3 available"));

    // Nothing was reserved
    assert_eq!(current_stock(&ctx, product_id).await, 3);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_decrements_stock() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Counted Corn", "2.00", 10).await;

    place_cod_order(&ctx, &customer, product_id, 4).await;

    assert_eq!(current_stock(&ctx, product_id).await, 6);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_requires_auth() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/orders"))
        .json(&json!({
            "items": [{ "productId": 1, "quantity": 1 }],
            "shippingAddress": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Online Payment Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server (mock gateway) and PostgreSQL"]
async fn test_online_checkout_below_minimum_rejected() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Cheap Parsley", "10.00", 50).await;

    // 10.00 + 1.00 tax + 5.00 shipping = 16.00, below the 50.00 minimum
    let resp = ctx
        .client
        .post(ctx.url("/orders/create-payment"))
        .bearer_auth(&customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 1 }],
            "shippingAddress": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    let message = body["message"].as_str().expect("message string");
    assert!(message.contains("below the online payment minimum"));
    assert!(message.contains("cash on delivery"));
}

#[tokio::test]
#[ignore = "Requires running API server (mock gateway) and PostgreSQL"]
async fn test_online_payment_flow() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Premium Salmon", "30.00", 20).await;

    // Open the payment: order is persisted pending, intent comes back
    let resp = ctx
        .client
        .post(ctx.url("/orders/create-payment"))
        .bearer_auth(&customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 2 }],
            "shippingAddress": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to create payment");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse response");

    let client_secret = body["clientSecret"].as_str().expect("client secret");
    assert!(!client_secret.is_empty());

    let order = &body["order"];
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["paymentMethod"], "online");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "pending");
    let intent_id = order["paymentIntentId"].as_str().expect("intent id");

    // Confirm: the mock gateway reports every intent as succeeded
    let resp = ctx
        .client
        .post(ctx.url("/orders/verify-payment"))
        .bearer_auth(&customer)
        .json(&json!({ "orderId": order_id, "paymentIntentId": intent_id }))
        .send()
        .await
        .expect("Failed to verify payment");

    assert_eq!(resp.status(), StatusCode::OK);
    let paid: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(paid["paymentStatus"], "completed");
    assert_eq!(paid["status"], "confirmed");

    // Verifying twice is a conflict, not a second confirmation
    let resp = ctx
        .client
        .post(ctx.url("/orders/verify-payment"))
        .bearer_auth(&customer)
        .json(&json!({ "orderId": order_id, "paymentIntentId": intent_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "order is already paid");
}

#[tokio::test]
#[ignore = "Requires running API server (mock gateway) and PostgreSQL"]
async fn test_verify_with_mismatched_intent_rejected() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Verified Venison", "60.00", 20).await;

    let resp = ctx
        .client
        .post(ctx.url("/orders/create-payment"))
        .bearer_auth(&customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 1 }],
            "shippingAddress": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to create payment");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse response");
    let order_id = body["order"]["id"].as_i64().expect("order id");

    let resp = ctx
        .client
        .post(ctx.url("/orders/verify-payment"))
        .bearer_auth(&customer)
        .json(&json!({
            "orderId": order_id,
            "paymentIntentId": "pi_mock_0000000000000000",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "payment intent does not match this order");
}

// ============================================================================
// Order History & Detail Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_my_orders_and_detail() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Historied Ginger", "3.00", 50).await;

    let first = place_cod_order(&ctx, &customer, product_id, 1).await;
    let second = place_cod_order(&ctx, &customer, product_id, 2).await;
    let first_id = first["id"].as_i64().expect("order id");
    let second_id = second["id"].as_i64().expect("order id");

    // History holds both, newest first
    let resp = ctx
        .client
        .get(ctx.url("/orders/my-orders"))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to get history");

    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.expect("Failed to parse history");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"].as_i64(), Some(second_id));
    assert_eq!(orders[1]["id"].as_i64(), Some(first_id));

    // Detail matches what checkout returned
    let resp = ctx
        .client
        .get(ctx.url(&format!("/orders/{first_id}")))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to get order");

    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(detail["orderNumber"], first["orderNumber"]);

    // Admins can read any order
    let admin = ctx.admin_token().await;
    let resp = ctx
        .client
        .get(ctx.url(&format!("/orders/{first_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::OK);

    // Strangers cannot
    let stranger = fresh_customer(&ctx).await;
    let resp = ctx
        .client
        .get(ctx.url(&format!("/orders/{first_id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_order_detail_unknown_id_not_found() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;

    let resp = ctx
        .client
        .get(ctx.url("/orders/999999999"))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cancel_restores_stock() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Returnable Rhubarb", "4.00", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 4).await;
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(current_stock(&ctx, product_id).await, 6);

    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to cancel order");

    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancelReason"], "Cancelled by user");
    assert!(cancelled["cancelledAt"].is_string());

    assert_eq!(current_stock(&ctx, product_id).await, 10);

    // A cancelled order cannot be cancelled again
    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cancel_records_supplied_reason() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Regretted Radish", "1.10", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 2).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(&customer)
        .json(&json!({ "reason": "Ordered by mistake" }))
        .send()
        .await
        .expect("Failed to cancel order");

    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(cancelled["cancelReason"], "Ordered by mistake");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cancel_foreign_order_forbidden() {
    let ctx = TestContext::new().await;
    let owner = fresh_customer(&ctx).await;
    let stranger = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Guarded Guava", "5.00", 10).await;

    let order = place_cod_order(&ctx, &owner, product_id, 1).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(&stranger)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cancel_after_processing_rejected() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Shipped Shallot", "2.50", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 1).await;
    let order_id = order["id"].as_i64().expect("order id");

    for status in ["confirmed", "processing"] {
        let resp = ctx
            .client
            .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
            .bearer_auth(&admin)
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Failed to update status");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    let message = body["message"].as_str().expect("message string");
    assert!(message.contains("no longer be cancelled"));
}

// ============================================================================
// Admin Fulfillment Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_status_pipeline() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Fulfilled Fig", "3.75", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 1).await;
    let order_id = order["id"].as_i64().expect("order id");

    // Walk the whole pipeline in order
    for status in ["confirmed", "processing", "shipped", "delivered"] {
        let resp = ctx
            .client
            .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
            .bearer_auth(&admin)
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Failed to update status");

        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = resp.json().await.expect("Failed to parse order");
        assert_eq!(updated["status"], status);
    }

    // Delivered is terminal
    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
        .bearer_auth(&admin)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "cannot move order from delivered to cancelled");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_cannot_skip_stages() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Impatient Pear", "1.80", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 1).await;
    let order_id = order["id"].as_i64().expect("order id");

    // pending -> shipped skips confirmed and processing
    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
        .bearer_auth(&admin)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Same-status writes are not transitions either
    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
        .bearer_auth(&admin)
        .json(&json!({ "status": "pending" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_cancellation_restocks() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Recalled Radicchio", "2.20", 8).await;

    let order = place_cod_order(&ctx, &customer, product_id, 3).await;
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(current_stock(&ctx, product_id).await, 5);

    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
        .bearer_auth(&admin)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to cancel order");

    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancelReason"], "Cancelled by admin");

    assert_eq!(current_stock(&ctx, product_id).await, 8);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_endpoints_require_admin() {
    let ctx = TestContext::new().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Restricted Romaine", "1.40", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 1).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = ctx
        .client
        .put(ctx.url(&format!("/orders/admin/{order_id}/status")))
        .bearer_auth(&customer)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx
        .client
        .get(ctx.url("/orders/admin/all"))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_all_lists_every_order() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let customer = fresh_customer(&ctx).await;
    let product_id = seed_product(&ctx, "Census Cauliflower", "3.10", 10).await;

    let order = place_cod_order(&ctx, &customer, product_id, 1).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = ctx
        .client
        .get(ctx.url("/orders/admin/all"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to list orders");

    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.expect("Failed to parse orders");
    assert!(orders.iter().any(|o| o["id"].as_i64() == Some(order_id)));
}
