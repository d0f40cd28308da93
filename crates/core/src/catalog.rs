//! Catalog domain models as served by the Data API.
//!
//! These are wire-shaped types: the Data API owns the records, the front
//! ends only read and display them. Derived display state (effective
//! prices, availability, lifecycle) is computed by the sibling modules,
//! never stored back into these structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, MediaId, Money, OfferId, OfferStatus, ProductId};

// =============================================================================
// Media
// =============================================================================

/// Kind of a product media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// A product image or video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Media ID.
    pub id: MediaId,
    /// Owning product.
    pub product_id: ProductId,
    /// Image or video.
    pub kind: MediaKind,
    /// Public URL of the asset.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: Option<String>,
    /// Representative-thumbnail flag. At most one item per product
    /// carries it.
    pub is_primary: bool,
}

/// Pick the representative media item of a gallery.
///
/// The explicit `is_primary` flag wins; without one, the first item in
/// list order stands in. `None` only for an empty gallery.
#[must_use]
pub fn primary_media(items: &[MediaItem]) -> Option<&MediaItem> {
    items.iter().find(|item| item.is_primary).or_else(|| items.first())
}

// =============================================================================
// Categories
// =============================================================================

/// Category summary as embedded in parent references and products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A catalog category. "Main" when it has no parent, a subcategory
/// otherwise; the hierarchy is one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Unique URL-safe slug.
    pub slug: String,
    /// Parent category; `None` marks a main category.
    #[serde(default)]
    pub parent: Option<CategoryRef>,
    /// Admin visibility flag.
    pub is_active: bool,
    /// Manual ordering among siblings.
    pub sort_order: i32,
    /// Number of direct subcategories.
    pub children_count: u32,
    /// Number of products. For a main category the server already rolls
    /// descendant products into this figure; it is displayed verbatim.
    pub products_count: u32,
    /// Direct subcategories, when the listing embedded them.
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// True for top-level categories.
    #[must_use]
    pub const fn is_main(&self) -> bool {
        self.parent.is_none()
    }
}

// =============================================================================
// Offers
// =============================================================================

/// Product summary embedded in offer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub title: String,
    /// List price, for showing the crossed-out original next to the offer.
    pub price: Money,
}

/// A time-bounded promotional price for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer ID.
    pub id: OfferId,
    /// Owning product. One current offer per product at a time.
    pub product_id: ProductId,
    /// Product summary; embedded by offer listings, omitted when the offer
    /// itself is embedded under a product.
    #[serde(default)]
    pub product: Option<ProductRef>,
    /// Promotional unit price; strictly below the list price.
    pub offer_price: Money,
    /// Advertised discount. Computed from the prices when absent.
    #[serde(default)]
    pub percentage_discount: Option<u8>,
    /// Window open instant; open-ended when absent.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Window close instant; open-ended when absent.
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Admin kill-switch. Dates are ignored while this is false.
    pub is_active: bool,
}

impl Offer {
    /// Classify the offer's lifecycle at `now`.
    ///
    /// The active flag takes precedence over the dates, and both window
    /// boundaries are inclusive: `now == starts_at` and `now == ends_at`
    /// both count as inside the window. A missing boundary leaves that
    /// side open.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> OfferStatus {
        if !self.is_active {
            return OfferStatus::Inactive;
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return OfferStatus::Scheduled;
        }
        if self.ends_at.is_some_and(|end| now > end) {
            return OfferStatus::Expired;
        }
        OfferStatus::Active
    }
}

// =============================================================================
// Products
// =============================================================================

/// A sellable product as served by the Data API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Rich-text description, sanitized server-side.
    pub description: String,
    /// List price per unit.
    pub price: Money,
    /// Units on hand.
    pub stock: u32,
    /// Storefront visibility flag, independent of stock.
    pub is_active: bool,
    /// Highlighted in the storefront featured sections.
    pub is_featured: bool,
    /// Direct category (may be a main category or a subcategory).
    pub category: CategoryRef,
    /// Media gallery in display order.
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Promotional offer currently attached, if any. Whether it applies
    /// still depends on its lifecycle at display time.
    #[serde(default)]
    pub current_offer: Option<Offer>,
}

impl Product {
    /// The representative media item for cards and thumbnails.
    #[must_use]
    pub fn primary_media(&self) -> Option<&MediaItem> {
        primary_media(&self.media)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a paginated Data API listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// 1-based page number.
    pub current_page: u32,
    /// Last available page number.
    pub last_page: u32,
    /// Page size the server applied.
    pub per_page: u32,
    /// Total items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// An empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: Vec::new(),
            current_page: 1,
            last_page: 1,
            per_page: 0,
            total: 0,
        }
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    /// Map the items, keeping the pagination envelope.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
