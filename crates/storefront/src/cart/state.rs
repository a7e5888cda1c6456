//! Cart lines and the pure cart transition function.
//!
//! Nothing in this module touches storage or notifications; [`CartState::apply`]
//! only computes what the cart would look like after an action.

use aurum_core::{Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product's entry in the cart.
///
/// Display fields and prices are a snapshot taken when the product was first
/// added; they are not refreshed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub primary_image_url: Option<String>,
    pub slug: String,
    pub unit_price: Decimal,
    pub original_unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub stock_quantity_at_add_time: Option<u32>,
}

impl CartLine {
    /// Snapshot a product into a new line.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            primary_image_url: product.primary_image().map(str::to_owned),
            slug: product.slug.clone(),
            unit_price: product.price,
            original_unit_price: product.original_price.unwrap_or(product.price),
            quantity,
            stock_quantity_at_add_time: product.stock_quantity,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Amount saved against the original price, never negative.
    #[must_use]
    pub fn line_savings(&self) -> Decimal {
        if self.original_unit_price > self.unit_price {
            (self.original_unit_price - self.unit_price) * Decimal::from(self.quantity)
        } else {
            Decimal::ZERO
        }
    }
}

/// A requested change to the cart.
#[derive(Debug, Clone, Copy)]
pub enum CartAction<'a> {
    /// Add `quantity` units of a product (merging into an existing line).
    Add { product: &'a Product, quantity: u32 },
    /// Remove a product's line.
    Remove { product_id: ProductId },
    /// Set a line's quantity; zero or below removes it.
    SetQuantity { product_id: ProductId, quantity: i64 },
    /// Remove every line.
    Clear,
}

/// What an applied action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOutcome {
    /// A new line was appended.
    Added { name: String },
    /// An existing line's quantity was increased.
    Incremented { name: String, quantity: u32 },
    /// A line was removed.
    Removed { name: String },
    /// A line's quantity was set (after clamping).
    QuantitySet { name: String, quantity: u32 },
    /// The cart was emptied.
    Cleared,
    /// Nothing to do, e.g. the product was not in the cart.
    Unchanged,
}

/// Result of applying an action: the next state and what happened.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: CartState,
    pub outcome: CartOutcome,
}

impl Transition {
    /// Whether the transition must be persisted.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.outcome != CartOutcome::Unchanged
    }
}

/// Ordered cart lines, at most one per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    lines: Vec<CartLine>,
    max_line_quantity: u32,
}

impl CartState {
    /// An empty cart. `max_line_quantity` bounds quantity edits on lines
    /// with no known stock level.
    #[must_use]
    pub const fn empty(max_line_quantity: u32) -> Self {
        Self {
            lines: Vec::new(),
            max_line_quantity,
        }
    }

    /// Rebuild a cart from previously persisted lines.
    ///
    /// Lines with a zero quantity are dropped and duplicate products are
    /// merged into the first occurrence, so the returned state always holds
    /// the one-line-per-product invariant. The flag reports whether any
    /// repair was needed.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>, max_line_quantity: u32) -> (Self, bool) {
        let original_len = lines.len();
        let mut repaired = false;
        let mut merged: Vec<CartLine> = Vec::with_capacity(original_len);

        for line in lines {
            if line.quantity == 0 {
                repaired = true;
                continue;
            }
            if let Some(existing) = merged.iter_mut().find(|l| l.product_id == line.product_id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                repaired = true;
            } else {
                merged.push(line);
            }
        }

        (
            Self {
                lines: merged,
                max_line_quantity,
            },
            repaired,
        )
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn max_line_quantity(&self) -> u32 {
        self.max_line_quantity
    }

    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Σ `unit_price * quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Σ `quantity`.
    #[must_use]
    pub fn items_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_savings).sum()
    }

    /// Upper bound for a quantity edit on `line`.
    ///
    /// A recorded stock of zero is treated as unknown rather than as a bound,
    /// otherwise the edit would produce an empty line.
    fn quantity_cap(&self, line: &CartLine) -> u32 {
        line.stock_quantity_at_add_time
            .filter(|&stock| stock > 0)
            .unwrap_or(self.max_line_quantity)
    }

    /// Compute the state after `action` without mutating `self`.
    #[must_use]
    pub fn apply(&self, action: CartAction<'_>) -> Transition {
        match action {
            CartAction::Add { product, quantity } => self.add(product, quantity),
            CartAction::Remove { product_id } => self.remove(product_id),
            CartAction::SetQuantity {
                product_id,
                quantity,
            } => self.set_quantity(product_id, quantity),
            CartAction::Clear => Transition {
                next: Self::empty(self.max_line_quantity),
                outcome: CartOutcome::Cleared,
            },
        }
    }

    fn add(&self, product: &Product, quantity: u32) -> Transition {
        // Adding "nothing" still means one unit from a button press.
        let quantity = quantity.max(1);
        let mut next = self.clone();

        if let Some(line) = next.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            let outcome = CartOutcome::Incremented {
                name: line.name.clone(),
                quantity: line.quantity,
            };
            return Transition { next, outcome };
        }

        next.lines.push(CartLine::from_product(product, quantity));
        Transition {
            next,
            outcome: CartOutcome::Added {
                name: product.name.clone(),
            },
        }
    }

    fn remove(&self, product_id: ProductId) -> Transition {
        let Some(position) = self.lines.iter().position(|l| l.product_id == product_id) else {
            return self.unchanged();
        };
        let mut next = self.clone();
        let line = next.lines.remove(position);
        Transition {
            next,
            outcome: CartOutcome::Removed { name: line.name },
        }
    }

    fn set_quantity(&self, product_id: ProductId, quantity: i64) -> Transition {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let mut next = self.clone();
        let Some(line) = next.lines.iter_mut().find(|l| l.product_id == product_id) else {
            return self.unchanged();
        };

        let cap = self.quantity_cap(line);
        let clamped = u32::try_from(quantity).unwrap_or(u32::MAX).min(cap);
        line.quantity = clamped;
        let outcome = CartOutcome::QuantitySet {
            name: line.name.clone(),
            quantity: clamped,
        };
        Transition { next, outcome }
    }

    fn unchanged(&self) -> Transition {
        Transition {
            next: self.clone(),
            outcome: CartOutcome::Unchanged,
        }
    }
}
