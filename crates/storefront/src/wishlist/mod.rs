//! Saved-products wishlist backed by the remote API.
//!
//! The remote collection is authoritative. [`WishlistStore`] keeps a
//! read-through copy that is thrown away and re-fetched after every
//! mutation, and is disabled entirely while the shopper is signed out.
//!
//! No operation here returns an error: failures become a single
//! notification, and queries degrade to `false` / `0`.

use std::future::Future;

use aurum_core::ProductId;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::api::ApiError;
use crate::notify::{Notification, Notifier};

/// Shown when a signed-out shopper tries to change the wishlist.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to use your wishlist";

/// A saved-product marker, normalized from the API's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// The entry's own `id` field.
    pub id: Option<ProductId>,
    /// The nested product reference's id.
    pub product_id: Option<ProductId>,
    /// Display summary of the product, when the API embeds one.
    pub product: Option<WishlistProduct>,
}

impl WishlistEntry {
    /// Whether this entry refers to `product_id` through either id field.
    #[must_use]
    pub fn matches(&self, product_id: ProductId) -> bool {
        self.id == Some(product_id) || self.product_id == Some(product_id)
    }
}

/// Product fields the API embeds in a wishlist entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Remote wishlist operations the store depends on.
pub trait WishlistApi {
    /// Fetch the shopper's wishlist.
    fn list_wishlist(&self) -> impl Future<Output = Result<Vec<WishlistEntry>, ApiError>> + Send;

    /// Save a product.
    fn add_to_wishlist(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Unsave a product.
    fn remove_from_wishlist(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Ask whether a product is saved.
    fn check_wishlist(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

/// Which mutation a wishlist call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Add,
    Remove,
}

/// The wishlist store.
pub struct WishlistStore<A, N> {
    api: A,
    notifier: N,
    authenticated: bool,
    /// Unix timestamp at which the session lapses, if it does.
    expires_at: Option<i64>,
    /// `None` while not loaded or invalidated.
    cache: Option<Vec<WishlistEntry>>,
}

impl<A: WishlistApi, N: Notifier> WishlistStore<A, N> {
    /// Create a signed-out store with an empty cache.
    pub const fn new(api: A, notifier: N) -> Self {
        Self {
            api,
            notifier,
            authenticated: false,
            expires_at: None,
            cache: None,
        }
    }

    /// Enable or disable the store for the current shopper.
    ///
    /// Signing out drops the cached collection. Signing in invalidates it
    /// so the next [`WishlistStore::ensure_loaded`] fetches.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        if self.authenticated != authenticated {
            debug!(authenticated, "Wishlist authentication changed");
        }
        self.authenticated = authenticated;
        self.expires_at = None;
        self.cache = None;
    }

    /// Enable the store for a session that lapses at `expires_at`.
    ///
    /// Once that moment passes the store behaves as signed out.
    pub fn sign_in_until(&mut self, expires_at: Option<i64>) {
        self.set_authenticated(true);
        self.expires_at = expires_at;
    }

    /// Whether a shopper is signed in and the session has not lapsed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
            && self
                .expires_at
                .is_none_or(|expires_at| Utc::now().timestamp() < expires_at)
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Fetch the remote collection and replace the cache.
    ///
    /// Returns an empty list without any remote call while signed out. A
    /// failed fetch is logged and also yields an empty list.
    #[instrument(skip(self))]
    pub async fn fetch_all(&mut self) -> Vec<WishlistEntry> {
        if !self.is_authenticated() {
            return Vec::new();
        }
        match self.api.list_wishlist().await {
            Ok(entries) => {
                debug!(count = entries.len(), "Fetched wishlist");
                self.cache = Some(entries.clone());
                entries
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch wishlist");
                Vec::new()
            }
        }
    }

    /// Fetch only if signed in and the cache is not loaded.
    pub async fn ensure_loaded(&mut self) {
        if self.is_authenticated() && self.cache.is_none() {
            self.fetch_all().await;
        }
    }

    /// Drop the cache and re-fetch it.
    async fn invalidate(&mut self) {
        self.cache = None;
        self.fetch_all().await;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Save the product if it is not saved, otherwise unsave it.
    ///
    /// Membership is asked of the API rather than the cache. If that check
    /// fails twice the store attempts an add; a duplicate add is reported by
    /// the API as "already" present and treated as success.
    #[instrument(skip(self))]
    pub async fn toggle_wishlist(&mut self, product_id: ProductId) {
        if !self.require_login() {
            return;
        }

        let membership = match self.api.check_wishlist(product_id).await {
            Ok(present) => Ok(present),
            Err(first) => {
                debug!(error = %first, "Wishlist membership check failed, retrying");
                self.api.check_wishlist(product_id).await
            }
        };

        match membership {
            Ok(true) => self.mutate(Mutation::Remove, product_id).await,
            Ok(false) => self.mutate(Mutation::Add, product_id).await,
            Err(e) => {
                warn!(error = %e, "Wishlist membership unknown, attempting add");
                self.mutate(Mutation::Add, product_id).await;
            }
        }
    }

    /// Save a product.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(&mut self, product_id: ProductId) {
        if self.require_login() {
            self.mutate(Mutation::Add, product_id).await;
        }
    }

    /// Unsave a product.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&mut self, product_id: ProductId) {
        if self.require_login() {
            self.mutate(Mutation::Remove, product_id).await;
        }
    }

    fn require_login(&self) -> bool {
        let authenticated = self.is_authenticated();
        if !authenticated {
            self.notifier
                .notify(Notification::error(LOGIN_REQUIRED_MESSAGE));
        }
        authenticated
    }

    /// Product name from the cached entry, when the API embedded one.
    fn product_name(&self, product_id: ProductId) -> Option<String> {
        self.cache
            .as_ref()?
            .iter()
            .find(|e| e.matches(product_id))?
            .product
            .as_ref()?
            .name
            .clone()
    }

    async fn mutate(&mut self, mutation: Mutation, product_id: ProductId) {
        let known_name = self.product_name(product_id);
        let result = match mutation {
            Mutation::Add => self.api.add_to_wishlist(product_id).await,
            Mutation::Remove => self.api.remove_from_wishlist(product_id).await,
        };

        match result {
            Ok(()) => {
                self.invalidate().await;
                let name = self.product_name(product_id).or(known_name);
                let message = match (mutation, name) {
                    (Mutation::Add, Some(name)) => format!("{name} added to wishlist"),
                    (Mutation::Add, None) => "Added to wishlist".to_string(),
                    (Mutation::Remove, Some(name)) => format!("{name} removed from wishlist"),
                    (Mutation::Remove, None) => "Removed from wishlist".to_string(),
                };
                self.notifier.notify(Notification::success(message));
            }
            Err(e) if e.is_already_present() => {
                debug!(error = %e, "Wishlist already up to date");
                self.invalidate().await;
            }
            Err(e) => {
                warn!(error = %e, ?mutation, "Wishlist update failed");
                self.notifier.notify(Notification::error(e.user_message()));
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the product is in the cached wishlist.
    ///
    /// Always `false` while signed out or before the cache is loaded.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        self.cache
            .as_ref()
            .is_some_and(|entries| entries.iter().any(|e| e.matches(product_id)))
    }

    /// Number of cached entries, 0 when not loaded.
    #[must_use]
    pub fn wishlist_count(&self) -> usize {
        if !self.is_authenticated() {
            return 0;
        }
        self.cache.as_ref().map_or(0, Vec::len)
    }

    /// Cached entries, empty when not loaded.
    #[must_use]
    pub fn entries(&self) -> &[WishlistEntry] {
        match &self.cache {
            Some(entries) if self.is_authenticated() => entries,
            _ => &[],
        }
    }
}
