//! Account, order and address types returned by the storefront API.
//!
//! Products live in `aurum-core`; wishlist entries and cashback offers are
//! owned by their stores. This module holds the rest of the API surface.

use aurum_core::{AddressId, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Account Types
// =============================================================================

/// The signed-in shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Raw body of a successful login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Login request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Order Types
// =============================================================================

/// A past order in the shopper's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order number, e.g. "AUR-10234".
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    #[serde(default)]
    pub cashback_earned: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Label shown in listings: the order number, or `#<id>`.
    #[must_use]
    pub fn display_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// One product line of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

// =============================================================================
// Address Types
// =============================================================================

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(flatten)]
    pub details: AddressInput,
}

/// Address fields, as sent when creating an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "India".to_string()
}

impl AddressInput {
    /// Single-line rendering for listings.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.extend([self.city.as_str(), self.state.as_str()]);
        format!("{} - {}", parts.join(", "), self.postal_code)
    }
}

// =============================================================================
// Product Query
// =============================================================================

/// Server-side product listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Query-string pairs for the non-empty parameters.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("category", category.to_owned()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}
