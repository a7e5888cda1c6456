//! Catalog product as returned by the storefront API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A product in the jewellery catalog.
///
/// Price fields accept either JSON strings (`"999.00"`) or numbers (`999`),
/// since the API is not consistent about which one it sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    /// Pre-discount price, when the product is on offer.
    #[serde(default, alias = "compareAtPrice")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Units on hand, if the API reports it.
    #[serde(default, alias = "stock")]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    /// Metal or material, e.g. "gold", "silver", "platinum".
    #[serde(default)]
    pub metal: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image URL, used as the card and cart thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether the product can currently be bought.
    ///
    /// Products without a reported stock level are assumed available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity.is_none_or(|qty| qty > 0)
    }

    /// Whether the product is priced below its original price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_string_price() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "name": "Ring",
            "slug": "ring",
            "price": "999"
        }))
        .unwrap();
        assert_eq!(product.price, Decimal::from(999));
        assert!(product.images.is_empty());
        assert!(product.in_stock());
        assert!(!product.is_discounted());
    }

    #[test]
    fn test_deserialize_numeric_price_and_aliases() {
        let product: Product = serde_json::from_value(json!({
            "id": 2,
            "name": "Solitaire Pendant",
            "slug": "solitaire-pendant",
            "price": 45000,
            "compareAtPrice": "52000",
            "stock": 0,
            "images": ["https://cdn.example/p.jpg"]
        }))
        .unwrap();
        assert_eq!(product.original_price, Some(Decimal::from(52000)));
        assert_eq!(product.stock_quantity, Some(0));
        assert!(!product.in_stock());
        assert!(product.is_discounted());
        assert_eq!(product.primary_image(), Some("https://cdn.example/p.jpg"));
    }
}
