//! Client-side product filtering, sorting and price formatting.
//!
//! The API already filters by search text and category. Everything else a
//! listing page offers (metal, price band, stock, sort order) is applied here
//! to an already-fetched page of products.

use aurum_core::{CurrencyCode, Price, Product};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Listing sort order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// API order.
    #[default]
    Featured,
    PriceLowToHigh,
    PriceHighToLow,
    /// Most recently added first; products without a date go last.
    Newest,
    NameAsc,
}

impl SortOrder {
    /// Parse from a URL or CLI value. Unknown values fall back to `Featured`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price-ascending" | "price_asc" | "price-low-high" => Self::PriceLowToHigh,
            "price-descending" | "price_desc" | "price-high-low" => Self::PriceHighToLow,
            "newest" => Self::Newest,
            "name" | "name-asc" => Self::NameAsc,
            _ => Self::Featured,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLowToHigh => "price-ascending",
            Self::PriceHighToLow => "price-descending",
            Self::Newest => "newest",
            Self::NameAsc => "name-asc",
        }
    }
}

/// Listing filters. Unset fields do not restrict.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or description.
    pub query: Option<String>,
    pub category: Option<String>,
    pub metal: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
    pub sort: SortOrder,
}

impl ProductFilter {
    fn matches(&self, product: &Product) -> bool {
        if let Some(query) = non_empty(self.query.as_deref()) {
            let query = query.to_lowercase();
            let hit = product.name.to_lowercase().contains(&query)
                || product.description.to_lowercase().contains(&query);
            if !hit {
                return false;
            }
        }
        if let Some(category) = non_empty(self.category.as_deref())
            && !eq_ignore_case(product.category.as_deref(), category)
        {
            return false;
        }
        if let Some(metal) = non_empty(self.metal.as_deref())
            && !eq_ignore_case(product.metal.as_deref(), metal)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        !self.in_stock_only || product.in_stock()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn eq_ignore_case(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted))
}

/// Apply `filter` and its sort order. Sorting is stable, so ties keep API order.
#[must_use]
pub fn filter_products(products: &[Product], filter: &ProductFilter) -> Vec<Product> {
    let mut matched: Vec<Product> = products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();

    match filter.sort {
        SortOrder::Featured => {}
        SortOrder::PriceLowToHigh => matched.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOrder::PriceHighToLow => matched.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::NameAsc => {
            matched.sort_by_cached_key(|p| p.name.to_lowercase());
        }
    }

    matched
}

/// Format an amount with the currency symbol, e.g. `₹1,24,999.00`.
#[must_use]
pub fn format_price(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Whole-percent discount of `price` against `original`, rounded down.
///
/// Returns `None` unless `original` is positive and above `price`.
#[must_use]
pub fn discount_percent(price: Decimal, original: Decimal) -> Option<u32> {
    if original <= Decimal::ZERO || price >= original {
        return None;
    }
    let percent = ((original - price) / original * Decimal::ONE_HUNDRED).floor();
    percent.to_u32().filter(|p| *p > 0)
}
