//! Catalog fixtures.

use aurum_core::{Product, ProductId};
use rust_decimal::Decimal;
use serde_json::json;

/// A product deserialized from the API's wire shape, price as a string.
pub fn product(id: i64, name: &str, price: &str) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "price": price,
        "images": [format!("https://cdn.aurum.example/{id}.jpg")]
    }))
    .unwrap()
}

/// A product with a reported stock level.
pub fn product_with_stock(id: i64, name: &str, price: &str, stock: u32) -> Product {
    Product {
        stock_quantity: Some(stock),
        ..product(id, name, price)
    }
}

/// A discounted product.
pub fn discounted(id: i64, name: &str, price: &str, original: &str) -> Product {
    Product {
        original_price: Some(original.parse::<Decimal>().unwrap()),
        ..product(id, name, price)
    }
}

pub const fn pid(id: i64) -> ProductId {
    ProductId::new(id)
}
