//! Normalization of loosely-shaped API responses.
//!
//! The API wraps some responses in `{ "data": ... }` and not others, and
//! sends ids as either numbers or strings. Everything is mapped to one
//! canonical shape here, before it reaches a store.

use aurum_core::ProductId;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::wishlist::{WishlistEntry, WishlistProduct};

/// Items of a list response: a bare array or `{ "data": [...] }`.
///
/// Any other shape yields an empty list.
pub(crate) fn list_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// A single-object response, unwrapping `{ "data": {...} }` when present.
pub(crate) fn single_item(body: Value) -> Value {
    match body {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Deserialize every item of a list response, skipping malformed items.
pub(crate) fn typed_list<T: DeserializeOwned>(body: Value, what: &'static str) -> Vec<T> {
    list_items(body)
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(kind = what, error = %e, "Skipping malformed item in API response");
                None
            }
        })
        .collect()
}

// =============================================================================
// Wishlist
// =============================================================================

/// Normalize a wishlist list response.
pub(crate) fn wishlist_entries(body: Value) -> Vec<WishlistEntry> {
    list_items(body)
        .iter()
        .filter_map(|item| {
            let entry = wishlist_entry(item);
            if entry.is_none() {
                warn!(item = %item, "Skipping wishlist entry without a usable id");
            }
            entry
        })
        .collect()
}

/// Map one wire entry to the canonical shape.
///
/// The entry's own `id` and its nested `product.id` are both kept, since the
/// API has used either to carry the product identifier.
fn wishlist_entry(item: &Value) -> Option<WishlistEntry> {
    let Value::Object(map) = item else {
        return None;
    };

    let id = map.get("id").and_then(ProductId::coerce);
    let nested = map.get("product").filter(|p| p.is_object());
    let product_id = nested
        .and_then(|p| p.get("id"))
        .and_then(ProductId::coerce);

    if id.is_none() && product_id.is_none() {
        return None;
    }

    let product = nested.and_then(|p| serde_json::from_value::<WishlistProduct>(p.clone()).ok());

    Some(WishlistEntry {
        id,
        product_id,
        product,
    })
}

/// Read `inWishlist` from a membership response (optionally enveloped).
pub(crate) fn membership(body: &Value) -> Option<bool> {
    body.get("inWishlist")
        .or_else(|| body.get("data").and_then(|d| d.get("inWishlist")))
        .and_then(Value::as_bool)
}

// =============================================================================
// Errors
// =============================================================================

/// Best-effort message from an error body: `message`, then `error`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"].into_iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}
