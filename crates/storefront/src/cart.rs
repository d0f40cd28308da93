//! Cart page: line review, quantity controls, clear-cart confirmation.
//!
//! The page mirrors the server cart into a local [`Cart`] model so the
//! header badge and totals render without a round trip, and replays
//! every server snapshot into it so the server stays authoritative.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use chispa_client::api::{CartApi, CartSnapshot};
use chispa_client::error::Notice;
use chispa_core::action::ActionState;
use chispa_core::cart::{Cart, CartLine, CartSummary};
use chispa_core::confirm::ConfirmDialog;
use chispa_core::stock;
use chispa_core::types::{Money, ProductId};

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    /// Effective unit price, formatted.
    pub unit_price: String,
    pub subtotal: String,
    pub image_url: Option<String>,
    pub can_increment: bool,
    pub can_decrement: bool,
    /// False while a change for this line (or a cart clear) is in
    /// flight.
    pub controls_enabled: bool,
}

/// State of the cart page.
pub struct CartPage<'a> {
    api: &'a dyn CartApi,
    cart: Cart,
    /// Per-line request state; at most one change per line in flight.
    line_states: HashMap<ProductId, ActionState>,
    clear_dialog: ConfirmDialog<()>,
    loading: ActionState,
    notice: Option<Notice>,
}

impl<'a> CartPage<'a> {
    #[must_use]
    pub fn new(api: &'a dyn CartApi) -> Self {
        Self {
            api,
            cart: Cart::new(),
            line_states: HashMap::new(),
            clear_dialog: ConfirmDialog::default(),
            loading: ActionState::default(),
            notice: None,
        }
    }

    /// Subscribe to badge updates. Watchers fire on every applied
    /// snapshot with the refreshed item count and total.
    pub fn on_badge_change(&mut self, watcher: impl Fn(&CartSummary) + Send + Sync + 'static) {
        self.cart.on_change(watcher);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the server cart and mirror it locally.
    pub async fn load(&mut self, now: DateTime<Utc>) {
        if self.loading.begin().is_err() {
            return;
        }
        self.notice = None;
        match self.api.get_cart().await {
            Ok(snapshot) => {
                self.loading.succeed();
                self.apply_snapshot(snapshot, now);
            }
            Err(e) => {
                tracing::error!(error = %e, "cart load failed");
                self.notice = Some(Notice::from(&e));
                self.loading.fail(e.to_string());
            }
        }
    }

    /// Mirror a server snapshot into the local model, pruning request
    /// state for lines that disappeared.
    pub fn apply_snapshot(&mut self, snapshot: CartSnapshot, now: DateTime<Utc>) {
        let lines = snapshot
            .lines
            .into_iter()
            .map(|line| CartLine {
                product: line.product,
                quantity: line.quantity,
            })
            .collect();
        self.cart.replace_lines(lines, now);
        self.line_states
            .retain(|id, _| self.cart.line(*id).is_some());
    }

    // =========================================================================
    // Quantity controls
    // =========================================================================

    /// Add one unit to a line, up to the product's stock.
    pub async fn increment(&mut self, product_id: ProductId, now: DateTime<Utc>) {
        let Some(line) = self.cart.line(product_id) else {
            return;
        };
        if !stock::can_increment(line.quantity, line.product.stock) {
            return;
        }
        let target = line.quantity + 1;
        self.update_line(product_id, target, now).await;
    }

    /// Take one unit off a line. A single unit cannot be decremented
    /// away; removal is its own action.
    pub async fn decrement(&mut self, product_id: ProductId, now: DateTime<Utc>) {
        let Some(line) = self.cart.line(product_id) else {
            return;
        };
        if !stock::can_decrement(line.quantity) {
            return;
        }
        let target = line.quantity - 1;
        self.update_line(product_id, target, now).await;
    }

    /// Set a line to an exact quantity. Zero removes the line; setting
    /// the quantity the line already has sends nothing.
    pub async fn set_quantity(&mut self, product_id: ProductId, quantity: u32, now: DateTime<Utc>) {
        let Some(line) = self.cart.line(product_id) else {
            return;
        };
        if quantity == 0 {
            self.remove(product_id, now).await;
            return;
        }
        let target = quantity.clamp(1, line.product.stock.max(1));
        if target == line.quantity {
            return;
        }
        self.update_line(product_id, target, now).await;
    }

    /// Drop a line from the cart.
    pub async fn remove(&mut self, product_id: ProductId, now: DateTime<Utc>) {
        if self.clear_dialog.is_pending() || self.line_state(product_id).begin().is_err() {
            return;
        }
        self.notice = None;
        match self.api.remove_cart_line(product_id).await {
            Ok(snapshot) => {
                self.line_states.remove(&product_id);
                self.apply_snapshot(snapshot, now);
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %product_id, "cart line removal failed");
                self.notice = Some(Notice::from(&e));
                self.line_state(product_id).fail(e.to_string());
            }
        }
    }

    async fn update_line(&mut self, product_id: ProductId, quantity: u32, now: DateTime<Utc>) {
        if self.clear_dialog.is_pending() || self.line_state(product_id).begin().is_err() {
            return;
        }
        self.notice = None;
        match self.api.update_cart_line(product_id, quantity).await {
            Ok(snapshot) => {
                self.line_state(product_id).succeed();
                self.apply_snapshot(snapshot, now);
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %product_id, "cart update failed");
                self.notice = Some(Notice::from(&e));
                self.line_state(product_id).fail(e.to_string());
            }
        }
    }

    fn line_state(&mut self, product_id: ProductId) -> &mut ActionState {
        self.line_states.entry(product_id).or_default()
    }

    // =========================================================================
    // Clear cart
    // =========================================================================

    /// Open the clear-cart confirmation. Ignored on an empty cart.
    pub fn request_clear(&mut self) {
        if !self.cart.is_empty() {
            self.clear_dialog.open(());
        }
    }

    /// Close the confirmation without clearing. Refused while the clear
    /// is in flight.
    pub fn cancel_clear(&mut self) -> bool {
        self.clear_dialog.dismiss()
    }

    /// Empty the cart after the dialog was confirmed.
    pub async fn confirm_clear(&mut self, now: DateTime<Utc>) {
        if self.clear_dialog.begin().is_none() {
            return;
        }
        match self.api.clear_cart().await {
            Ok(()) => {
                self.clear_dialog.complete();
                self.line_states.clear();
                self.cart.clear(now);
            }
            Err(e) => {
                tracing::error!(error = %e, "clear cart failed");
                self.notice = Some(Notice::from(&e));
                self.clear_dialog.fail(e.to_string());
            }
        }
    }

    /// Empty the cart without a confirmation round, for the moment the
    /// checkout has handed the order off to WhatsApp.
    pub async fn clear_after_checkout(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.api.clear_cart().await {
            // the order already left; the stale server cart self-heals
            // on the next load
            tracing::warn!(error = %e, "cart clear after hand-off failed");
        }
        self.line_states.clear();
        self.cart.clear(now);
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Line views in display order as of `now`.
    #[must_use]
    pub fn lines(&self, now: DateTime<Utc>) -> Vec<CartLineView> {
        let clear_pending = self.clear_dialog.is_pending();
        self.cart
            .lines()
            .iter()
            .map(|line| {
                let enabled = !clear_pending
                    && self
                        .line_states
                        .get(&line.product.id)
                        .is_none_or(ActionState::is_enabled);
                CartLineView {
                    product_id: line.product.id,
                    title: line.product.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price(now).to_string(),
                    subtotal: line.subtotal(now).to_string(),
                    image_url: line.product.primary_media().map(|media| media.url.clone()),
                    can_increment: enabled
                        && stock::can_increment(line.quantity, line.product.stock),
                    can_decrement: enabled && stock::can_decrement(line.quantity),
                    controls_enabled: enabled,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn total(&self, now: DateTime<Utc>) -> Money {
        self.cart.total(now)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// The mirrored cart model, for the checkout page.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn is_clear_dialog_open(&self) -> bool {
        self.clear_dialog.is_open()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}
