//! In-memory stand-ins for the storefront's collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use aurum_core::ProductId;
use aurum_storefront::api::ApiError;
use aurum_storefront::session::BearerAuth;
use aurum_storefront::storage::{LocalStorage, MemoryStorage, StorageError};
use aurum_storefront::wishlist::{WishlistApi, WishlistEntry};
use secrecy::{ExposeSecret, SecretString};

// =============================================================================
// Wishlist API
// =============================================================================

#[derive(Default)]
struct FakeState {
    saved: Vec<ProductId>,
    calls: Vec<String>,
    token: Option<String>,
    check_failures: u32,
    list_failures: u32,
    mutation_errors: VecDeque<ApiError>,
}

/// Wishlist API backed by a list of saved ids.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// store.
#[derive(Clone, Default)]
pub struct FakeWishlistApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeWishlistApi {
    pub fn with_saved(ids: &[i64]) -> Self {
        let api = Self::default();
        api.lock().saved = ids.iter().copied().map(ProductId::new).collect();
        api
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls made so far, e.g. `["check 5", "add 5", "list"]`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn saved(&self) -> Vec<ProductId> {
        self.lock().saved.clone()
    }

    /// Bearer token currently installed.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Fail the next `n` membership checks.
    pub fn fail_checks(&self, n: u32) {
        self.lock().check_failures = n;
    }

    /// Fail the next `n` list fetches.
    pub fn fail_lists(&self, n: u32) {
        self.lock().list_failures = n;
    }

    /// Fail the next add or remove with `err`.
    pub fn fail_next_mutation(&self, err: ApiError) {
        self.lock().mutation_errors.push_back(err);
    }
}

impl BearerAuth for FakeWishlistApi {
    fn set_bearer(&self, token: Option<SecretString>) {
        self.lock().token = token.map(|t| t.expose_secret().to_owned());
    }
}

impl WishlistApi for FakeWishlistApi {
    async fn list_wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError> {
        let mut state = self.lock();
        state.calls.push("list".to_string());
        if state.list_failures > 0 {
            state.list_failures -= 1;
            return Err(ApiError::Api {
                status: 503,
                message: None,
            });
        }
        Ok(state
            .saved
            .iter()
            .map(|&id| WishlistEntry {
                id: Some(id),
                product_id: None,
                product: None,
            })
            .collect())
    }

    async fn add_to_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(format!("add {product_id}"));
        if let Some(err) = state.mutation_errors.pop_front() {
            return Err(err);
        }
        if !state.saved.contains(&product_id) {
            state.saved.push(product_id);
        }
        Ok(())
    }

    async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(format!("remove {product_id}"));
        if let Some(err) = state.mutation_errors.pop_front() {
            return Err(err);
        }
        state.saved.retain(|&id| id != product_id);
        Ok(())
    }

    async fn check_wishlist(&self, product_id: ProductId) -> Result<bool, ApiError> {
        let mut state = self.lock();
        state.calls.push(format!("check {product_id}"));
        if state.check_failures > 0 {
            state.check_failures -= 1;
            return Err(ApiError::UnexpectedResponse("check timed out".to_string()));
        }
        Ok(state.saved.contains(&product_id))
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Memory storage whose writes can be switched off.
///
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    inner: Arc<Mutex<(MemoryStorage, bool)>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `set` and `remove` fail.
    pub fn break_writes(&self) {
        self.lock().1 = true;
    }

    /// Raw value stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().0.get(key).unwrap()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.lock().0.set(key, value).unwrap();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, (MemoryStorage, bool)> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_error() -> StorageError {
        StorageError::Io(std::io::Error::other("disk full"))
    }
}

impl LocalStorage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.lock().0.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.lock();
        if guard.1 {
            return Err(Self::write_error());
        }
        guard.0.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.lock();
        if guard.1 {
            return Err(Self::write_error());
        }
        guard.0.remove(key)
    }
}
