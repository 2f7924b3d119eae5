//! Product, review, and price alert domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdura_core::{CategoryId, Email, Money, PriceAlertId, ProductId, ReviewId, UserId};

/// A grocery product in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Current selling price.
    pub price: Money,
    /// Pre-discount price, shown struck through when present.
    pub original_price: Option<Money>,
    /// Category this product belongs to, if any.
    pub category_id: Option<CategoryId>,
    /// Units currently in stock.
    pub stock: i32,
    /// Selling unit (e.g., "kg", "bunch", "500g pack").
    pub unit: String,
    /// Image URLs in display order.
    pub images: Vec<String>,
    /// Average review rating, 0 when unreviewed.
    pub rating: Decimal,
    /// Number of reviews backing the rating.
    pub num_reviews: i32,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A customer review of a product.
///
/// One review per (product, user) pair, enforced by the database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    /// Unique review ID.
    pub id: ReviewId,
    /// Product being reviewed.
    pub product_id: ProductId,
    /// User who wrote the review.
    pub user_id: UserId,
    /// Star rating, 1 through 5.
    pub rating: i16,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
}

/// A price drop subscription for a product.
///
/// `user_id` is set when the subscriber was logged in; guests subscribe
/// with a bare email address. Not serialized: subscriber lists are never
/// exposed through the API.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceAlert {
    /// Unique alert ID.
    pub id: PriceAlertId,
    /// Product being watched.
    pub product_id: ProductId,
    /// Subscriber's account, if they were logged in.
    pub user_id: Option<UserId>,
    /// Address to notify.
    pub email: Email,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Selling price.
    pub price: Money,
    /// Pre-discount price, if the product launches discounted.
    pub original_price: Option<Money>,
    /// Category to file the product under.
    pub category_id: Option<CategoryId>,
    /// Initial stock level.
    pub stock: i32,
    /// Selling unit (e.g., "kg").
    pub unit: String,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

/// Input for updating a product. Omitted fields keep their current value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    /// Display name.
    pub name: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Selling price.
    pub price: Option<Money>,
    /// Pre-discount price.
    pub original_price: Option<Money>,
    /// Category to file the product under.
    pub category_id: Option<CategoryId>,
    /// Stock level.
    pub stock: Option<i32>,
    /// Selling unit.
    pub unit: Option<String>,
    /// Image URLs in display order.
    pub images: Option<Vec<String>>,
}

/// Filter criteria for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to one category.
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Number of results to skip.
    pub offset: i64,
}
