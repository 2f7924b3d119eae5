//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdura_core::CategoryId;

/// A product category (e.g., "Fresh Vegetables").
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name, unique across categories.
    pub name: String,
    /// URL-safe slug derived from the name.
    pub slug: String,
    /// Optional description.
    pub description: Option<String>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Derive a URL slug from a category name.
///
/// Lowercases the trimmed name and replaces spaces with hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_replaces_spaces() {
        assert_eq!(slugify("Fresh Meat"), "fresh-meat");
    }

    #[test]
    fn test_slugify_lowercases() {
        assert_eq!(slugify("Dairy"), "dairy");
    }

    #[test]
    fn test_slugify_trims_surrounding_whitespace() {
        assert_eq!(slugify("  Organic Produce "), "organic-produce");
    }

    #[test]
    fn test_slugify_multi_word() {
        assert_eq!(slugify("Snacks And Baked Goods"), "snacks-and-baked-goods");
    }
}
