//! Cache types for catalog API responses.

use std::sync::Arc;

use aurum_core::Product;

use super::types::ProductQuery;

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    Products(ProductQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}
