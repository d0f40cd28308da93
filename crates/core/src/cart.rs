//! Order-preserving cart model with bounded line mutations.
//!
//! The authoritative cart lives behind the Data API; this model is a page's
//! working copy. It enforces the quantity bounds locally, recomputes totals
//! against the current offer state on every read, and pushes a summary to
//! registered watchers (the header badge) after each successful mutation.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::Product;
use crate::pricing::resolve_price;
use crate::stock;
use crate::types::{Money, ProductId};

/// Errors from cart line mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// No line exists for the product.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),
    /// Adding or incrementing would exceed the product's stock.
    #[error("only {stock} unit(s) of product {product_id} available")]
    OutOfStock { product_id: ProductId, stock: u32 },
    /// Decrementing below the minimum of one unit.
    #[error("quantity cannot drop below one unit, remove the line instead")]
    AtMinimumQuantity,
}

/// One product and the units of it in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product snapshot, including its current offer.
    pub product: Product,
    /// Units in the cart, kept within `1..=product.stock`.
    pub quantity: u32,
}

impl CartLine {
    /// Effective per-unit price at `now`, offer-aware.
    #[must_use]
    pub fn unit_price(&self, now: DateTime<Utc>) -> Money {
        resolve_price(self.product.price, self.product.current_offer.as_ref(), now).effective_price
    }

    /// Quantity times the effective unit price at `now`.
    #[must_use]
    pub fn subtotal(&self, now: DateTime<Utc>) -> Money {
        self.unit_price(now).times(self.quantity)
    }
}

/// Lightweight digest pushed to watchers after each mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    /// Total units across all lines.
    pub item_count: u32,
    /// Sum of line subtotals.
    pub total: Money,
}

type Watcher = Box<dyn Fn(&CartSummary) + Send + Sync>;

/// Order-preserving collection of cart lines.
///
/// Lines keep their insertion order through every mutation; removing a line
/// never reorders the rest.
#[derive(Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    watchers: Vec<Watcher>,
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("lines", &self.lines)
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

impl Cart {
    /// Empty cart with no watchers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a working copy from lines served by the Data API.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self {
            lines,
            watchers: Vec::new(),
        }
    }

    /// Register a change watcher, e.g. the header cart badge.
    pub fn on_change(&mut self, watcher: impl Fn(&CartSummary) + Send + Sync + 'static) {
        self.watchers.push(Box::new(watcher));
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }

    /// Units currently carried for a product; zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |line| line.quantity)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line subtotals at `now`.
    #[must_use]
    pub fn total(&self, now: DateTime<Utc>) -> Money {
        self.lines.iter().map(|line| line.subtotal(now)).sum()
    }

    /// Digest of the cart at `now`.
    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>) -> CartSummary {
        CartSummary {
            item_count: self.item_count(),
            total: self.total(now),
        }
    }

    /// Add units of a product.
    ///
    /// A product not yet in the cart gets a new line at the end; a product
    /// already present has its existing line raised instead, and the fresher
    /// product snapshot replaces the stored one. A zero `quantity` is
    /// treated as one.
    ///
    /// # Errors
    ///
    /// [`CartError::OutOfStock`] when the product has no stock or the merged
    /// quantity would exceed it.
    pub fn add(
        &mut self,
        product: Product,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<CartSummary, CartError> {
        let quantity = quantity.max(1);
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product.id == product.id)
        {
            let merged = line.quantity.saturating_add(quantity);
            if merged > product.stock {
                return Err(CartError::OutOfStock {
                    product_id: product.id,
                    stock: product.stock,
                });
            }
            line.quantity = merged;
            line.product = product;
        } else {
            if !stock::can_add(product.stock) {
                return Err(CartError::OutOfStock {
                    product_id: product.id,
                    stock: product.stock,
                });
            }
            let quantity = quantity.min(product.stock);
            self.lines.push(CartLine { product, quantity });
        }
        Ok(self.notify(now))
    }

    /// Raise a line's quantity by one, bounded by stock.
    ///
    /// # Errors
    ///
    /// [`CartError::LineNotFound`] for an absent line,
    /// [`CartError::OutOfStock`] at the stock ceiling.
    pub fn increment(
        &mut self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<CartSummary, CartError> {
        let line = self.line_mut(product_id)?;
        if !stock::can_increment(line.quantity, line.product.stock) {
            return Err(CartError::OutOfStock {
                product_id,
                stock: line.product.stock,
            });
        }
        line.quantity += 1;
        Ok(self.notify(now))
    }

    /// Lower a line's quantity by one, stopping at one unit.
    ///
    /// # Errors
    ///
    /// [`CartError::LineNotFound`] for an absent line,
    /// [`CartError::AtMinimumQuantity`] at one unit.
    pub fn decrement(
        &mut self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<CartSummary, CartError> {
        let line = self.line_mut(product_id)?;
        if !stock::can_decrement(line.quantity) {
            return Err(CartError::AtMinimumQuantity);
        }
        line.quantity -= 1;
        Ok(self.notify(now))
    }

    /// Set a line's quantity directly.
    ///
    /// Zero removes the line (the one uniform policy for every quantity
    /// control); other values clamp into `1..=stock`. Setting the quantity
    /// a line already has is a no-op: the cart does not change and watchers
    /// are not notified, signalled by `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`CartError::LineNotFound`] for an absent line.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<CartSummary>, CartError> {
        if quantity == 0 {
            return self.remove(product_id, now).map(Some);
        }
        let line = self.line_mut(product_id)?;
        let clamped = quantity.clamp(1, line.product.stock.max(1));
        if clamped == line.quantity {
            return Ok(None);
        }
        line.quantity = clamped;
        Ok(Some(self.notify(now)))
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// [`CartError::LineNotFound`] for an absent line.
    pub fn remove(
        &mut self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<CartSummary, CartError> {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != product_id);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound(product_id));
        }
        Ok(self.notify(now))
    }

    /// Drop every line.
    pub fn clear(&mut self, now: DateTime<Utc>) -> CartSummary {
        self.lines.clear();
        self.notify(now)
    }

    /// Replace the working copy with lines freshly served by the Data API,
    /// keeping registered watchers.
    pub fn replace_lines(&mut self, lines: Vec<CartLine>, now: DateTime<Utc>) -> CartSummary {
        self.lines = lines;
        self.notify(now)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Result<&mut CartLine, CartError> {
        self.lines
            .iter_mut()
            .find(|line| line.product.id == product_id)
            .ok_or(CartError::LineNotFound(product_id))
    }

    fn notify(&self, now: DateTime<Utc>) -> CartSummary {
        let summary = self.summary(now);
        for watcher in &self.watchers {
            watcher(&summary);
        }
        summary
    }
}
