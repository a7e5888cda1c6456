//! Client-local shopping cart.
//!
//! [`CartStore`] owns the authoritative list of cart lines and keeps it
//! mirrored in [`LocalStorage`] under [`CART_STORAGE_KEY`].
//!
//! # Persistence
//!
//! Every action goes through [`CartState::apply`] first. A transition that
//! changes the cart is written to storage and only then committed in memory,
//! so the in-memory lines always match the last durable write. A corrupted
//! persisted value is discarded at load and the cart starts empty.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut cart = CartStore::load(storage, notifier);
//! cart.add_to_cart(&product, 2)?;
//! assert_eq!(cart.cart_items_count(), 2);
//! ```

mod state;

pub use state::{CartAction, CartLine, CartOutcome, CartState, Transition};

use aurum_core::{Product, ProductId};
use rust_decimal::Decimal;
use tracing::{debug, error, instrument, warn};

use crate::config::DEFAULT_MAX_LINE_QUANTITY;
use crate::notify::{Notification, Notifier};
use crate::storage::{LocalStorage, StorageError};

/// Storage key holding the serialized cart lines.
pub const CART_STORAGE_KEY: &str = "cart";

/// The shopping cart store.
pub struct CartStore<S, N> {
    state: CartState,
    storage: S,
    notifier: N,
}

impl<S: LocalStorage, N: Notifier> CartStore<S, N> {
    /// Load the cart from storage with the default quantity cap.
    pub fn load(storage: S, notifier: N) -> Self {
        Self::load_with_limit(storage, notifier, DEFAULT_MAX_LINE_QUANTITY)
    }

    /// Load the cart from storage.
    ///
    /// Never fails: a missing, unreadable or corrupted value yields an empty
    /// cart. A corrupted value is also removed from storage.
    pub fn load_with_limit(mut storage: S, notifier: N, max_line_quantity: u32) -> Self {
        let state = match storage.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => {
                    let (state, repaired) = CartState::from_lines(lines, max_line_quantity);
                    if repaired {
                        warn!("Repaired persisted cart with duplicate or empty lines");
                    }
                    debug!(lines = state.lines().len(), "Loaded cart from storage");
                    state
                }
                Err(e) => {
                    warn!(error = %e, "Discarding corrupted cart data");
                    if let Err(e) = storage.remove(CART_STORAGE_KEY) {
                        warn!(error = %e, "Failed to remove corrupted cart data");
                    }
                    CartState::empty(max_line_quantity)
                }
            },
            Ok(None) => CartState::empty(max_line_quantity),
            Err(e) => {
                warn!(error = %e, "Failed to read cart from storage, starting empty");
                CartState::empty(max_line_quantity)
            }
        };

        Self {
            state,
            storage,
            notifier,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`.
    ///
    /// Increments an existing line (no stock clamp at add time) or appends a
    /// new line snapshotting the product. A quantity of zero adds one unit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart cannot be persisted, in which case
    /// the cart is left unchanged.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) -> Result<(), StorageError> {
        self.dispatch(CartAction::Add { product, quantity })
    }

    /// Add a single unit of `product`.
    ///
    /// # Errors
    ///
    /// See [`CartStore::add_to_cart`].
    pub fn add_one(&mut self, product: &Product) -> Result<(), StorageError> {
        self.add_to_cart(product, 1)
    }

    /// Remove a product's line. Silent no-op if it is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn remove_from_cart(&mut self, product_id: ProductId) -> Result<(), StorageError> {
        self.dispatch(CartAction::Remove { product_id })
    }

    /// Set a line's quantity, clamped to the stock recorded at add time.
    ///
    /// Zero or below removes the line. No-op if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StorageError> {
        self.dispatch(CartAction::SetQuantity {
            product_id,
            quantity,
        })
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        self.dispatch(CartAction::Clear)
    }

    fn dispatch(&mut self, action: CartAction<'_>) -> Result<(), StorageError> {
        let transition = self.state.apply(action);
        if !transition.is_change() {
            return Ok(());
        }

        if let Err(e) = persist(&mut self.storage, &transition.next) {
            error!(error = %e, "Failed to persist cart");
            self.notifier
                .notify(Notification::error("Could not save your cart. Please try again."));
            return Err(e);
        }

        self.state = transition.next;
        if let Some(notification) = notification_for(&transition.outcome) {
            self.notifier.notify(notification);
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.state.lines()
    }

    /// Σ `unit_price * quantity` over all lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.state.total()
    }

    /// Σ quantity over all lines.
    #[must_use]
    pub fn cart_items_count(&self) -> u64 {
        self.state.items_count()
    }

    /// Total saved against original prices.
    #[must_use]
    pub fn cart_savings(&self) -> Decimal {
        self.state.savings()
    }

    #[must_use]
    pub fn cart_item(&self, product_id: ProductId) -> Option<&CartLine> {
        self.state.line(product_id)
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.state.line(product_id).is_some()
    }

    /// Quantity of a product in the cart, 0 if absent.
    #[must_use]
    pub fn cart_quantity(&self, product_id: ProductId) -> u32 {
        self.state.line(product_id).map_or(0, |l| l.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lines().is_empty()
    }

    /// The storage backend, e.g. to inspect what was persisted.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Tear down the store, handing back its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn persist<S: LocalStorage>(storage: &mut S, state: &CartState) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(state.lines())?;
    storage.set(CART_STORAGE_KEY, &encoded)
}

fn notification_for(outcome: &CartOutcome) -> Option<Notification> {
    match outcome {
        CartOutcome::Added { name } => Some(Notification::success(format!("{name} added to cart"))),
        CartOutcome::Incremented { name, .. } => Some(Notification::success(format!(
            "{name} quantity updated in cart"
        ))),
        CartOutcome::Removed { name } => {
            Some(Notification::info(format!("{name} removed from cart")))
        }
        CartOutcome::Cleared => Some(Notification::info("Cart cleared")),
        CartOutcome::QuantitySet { .. } | CartOutcome::Unchanged => None,
    }
}
