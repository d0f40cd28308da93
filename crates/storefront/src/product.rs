//! Product detail page: gallery, quantity selector, add to cart.

use chrono::{DateTime, Utc};

use chispa_client::api::{CartApi, CartSnapshot, CatalogApi};
use chispa_client::error::{Notice, NoticeKind};
use chispa_core::action::ActionState;
use chispa_core::catalog::{MediaItem, Product};
use chispa_core::stock;
use chispa_core::types::ProductId;

use crate::catalog::ProductCard;

/// State of the product detail page.
pub struct ProductPage<'a> {
    catalog: &'a dyn CatalogApi,
    cart: &'a dyn CartApi,
    product: Option<Product>,
    /// Selected quantity, kept within `1..=stock`.
    quantity: u32,
    adding: ActionState,
    notice: Option<Notice>,
}

impl<'a> ProductPage<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogApi, cart: &'a dyn CartApi) -> Self {
        Self {
            catalog,
            cart,
            product: None,
            quantity: 1,
            adding: ActionState::default(),
            notice: None,
        }
    }

    /// Fetch the product. Inactive products are treated the same as
    /// missing ones; the storefront never renders them.
    pub async fn load(&mut self, id: ProductId) {
        self.notice = None;
        match self.catalog.get_product(id).await {
            Ok(product) if product.is_active => {
                self.quantity = 1;
                self.product = Some(product);
            }
            Ok(_) => {
                self.product = None;
                self.notice = Some(Notice {
                    kind: NoticeKind::Stale,
                    message: "El producto ya no está disponible.".to_string(),
                });
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %id, "product load failed");
                self.product = None;
                self.notice = Some(Notice::from(&e));
            }
        }
    }

    // =========================================================================
    // Quantity selector
    // =========================================================================

    pub fn increment_quantity(&mut self) {
        if let Some(product) = &self.product
            && stock::can_increment(self.quantity, product.stock)
        {
            self.quantity += 1;
        }
    }

    pub fn decrement_quantity(&mut self) {
        if stock::can_decrement(self.quantity) {
            self.quantity -= 1;
        }
    }

    // =========================================================================
    // Add to cart
    // =========================================================================

    /// Send the selected quantity to the cart.
    ///
    /// Returns the updated cart so the host can refresh the header
    /// badge; `None` when the product is sold out, a request is already
    /// in flight, or the request failed (the failure is recorded on the
    /// page).
    pub async fn add_to_cart(&mut self) -> Option<CartSnapshot> {
        let product = self.product.as_ref()?;
        if !stock::can_add(product.stock) || self.adding.begin().is_err() {
            return None;
        }
        self.notice = None;
        match self.cart.add_to_cart(product.id, self.quantity).await {
            Ok(snapshot) => {
                self.adding.succeed();
                Some(snapshot)
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %product.id, "add to cart failed");
                self.notice = Some(Notice::from(&e));
                self.adding.fail(e.to_string());
                None
            }
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Pricing and availability summary as of `now`.
    #[must_use]
    pub fn card(&self, now: DateTime<Utc>) -> Option<ProductCard> {
        self.product
            .as_ref()
            .map(|product| ProductCard::from_product(product, now))
    }

    /// Media gallery with the representative item first.
    #[must_use]
    pub fn gallery(&self) -> Vec<&MediaItem> {
        let Some(product) = &self.product else {
            return Vec::new();
        };
        let primary = product.primary_media();
        let mut items: Vec<&MediaItem> = primary.into_iter().collect();
        items.extend(
            product
                .media
                .iter()
                .filter(|item| primary.is_none_or(|p| p.id != item.id)),
        );
        items
    }

    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// True while the add-to-cart control should accept another press.
    #[must_use]
    pub fn can_add_to_cart(&self) -> bool {
        self.product
            .as_ref()
            .is_some_and(|product| stock::can_add(product.stock))
            && self.adding.is_enabled()
    }

    #[must_use]
    pub const fn is_adding(&self) -> bool {
        self.adding.is_pending()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}
