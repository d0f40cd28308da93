//! Data API operation traits and their input records.
//!
//! Split by concern so each page controller depends on (and each test can
//! fake) only the slice it drives: [`CatalogApi`] for the public read
//! paths, [`CartApi`] for the session cart and checkout, [`AdminApi`] for
//! back-office mutations. [`crate::http::HttpClient`] implements all three.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chispa_core::catalog::{CategoryNode, MediaKind, Offer, Page, Product};
use chispa_core::checkout::{OrderLine, ShippingInfo};
use chispa_core::types::{CategoryId, MediaId, Money, OfferId, ProductId};

use crate::error::ApiError;

/// Result alias for Data API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Listing filters
// =============================================================================

/// Visibility slice selectable in the admin products table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Active,
    Inactive,
}

/// Stock slice selectable in the admin products table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    InStock,
    OutOfStock,
}

/// Server-side filters for product listings. `None` fields are omitted
/// from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductFilters {
    /// Free-text search over title and description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Restrict to one category. A main category includes its
    /// subcategories' products server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    /// Restrict by visibility flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusFilter>,
    /// Restrict by stock slice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<StockFilter>,
    /// Page size override; the server default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Server-side filters for category listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// `Some(id)` narrows to the children of that category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<CategoryId>,
    /// Page size override; the server default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

// =============================================================================
// Mutation inputs
// =============================================================================

/// Fields for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub category_id: CategoryId,
    pub is_active: bool,
    pub is_featured: bool,
}

/// A media item staged alongside a product create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInput {
    pub kind: MediaKind,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
}

/// Fields for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    /// `None` creates a main category; the hierarchy is one level deep, so
    /// a parent must itself be a main category.
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
    pub sort_order: i32,
}

/// Fields for creating or updating an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferInput {
    pub offer_price: Money,
    pub percentage_discount: Option<u8>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

// =============================================================================
// Cart wire types
// =============================================================================

/// One server-side cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineSnapshot {
    /// Product with embedded category, media and current offer.
    pub product: Product,
    pub quantity: u32,
}

/// The session cart as served by the Data API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Lines in display order.
    pub lines: Vec<CartLineSnapshot>,
    /// Server-computed total. Pages recompute their own display total from
    /// the lines; this one is used for cross-checking.
    pub total: Money,
}

/// Result of the server-side order-message composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    pub success: bool,
    /// The human-readable WhatsApp order summary.
    pub message: String,
}

// =============================================================================
// Operation traits
// =============================================================================

/// Read-side catalog operations used by the storefront.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List products matching `filters`, one page at a time.
    async fn list_products(&self, filters: &ProductFilters, page: u32)
    -> ApiResult<Page<Product>>;

    /// Fetch one product with embedded category, media and current offer.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] when the product no longer exists.
    async fn get_product(&self, id: ProductId) -> ApiResult<Product>;

    /// List categories. Main categories come with their `children`
    /// embedded.
    async fn list_categories(
        &self,
        filters: &CategoryFilters,
        page: u32,
    ) -> ApiResult<Page<CategoryNode>>;

    /// Fetch one category with children embedded.
    async fn get_category(&self, id: CategoryId) -> ApiResult<CategoryNode>;
}

/// Session cart and checkout operations used by the storefront.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the current session cart.
    async fn get_cart(&self) -> ApiResult<CartSnapshot>;

    /// Add `quantity` units of a product, returning the updated cart.
    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> ApiResult<CartSnapshot>;

    /// Set a line's quantity, returning the updated cart.
    async fn update_cart_line(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> ApiResult<CartSnapshot>;

    /// Remove a line, returning the updated cart.
    async fn remove_cart_line(&self, product_id: ProductId) -> ApiResult<CartSnapshot>;

    /// Empty the cart.
    async fn clear_cart(&self) -> ApiResult<()>;

    /// Compose the WhatsApp order summary server-side from the itemized
    /// lines and the customer's shipping data.
    async fn compose_whatsapp_message(
        &self,
        lines: &[OrderLine],
        customer: &ShippingInfo,
    ) -> ApiResult<ComposedMessage>;
}

/// Back-office mutations used by the admin panel.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn create_product(
        &self,
        input: &ProductInput,
        media: &[MediaInput],
    ) -> ApiResult<Product>;

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
        media_add: &[MediaInput],
        media_remove: &[MediaId],
    ) -> ApiResult<Product>;

    async fn delete_product(&self, id: ProductId) -> ApiResult<()>;

    /// Mark one existing media item as the product's representative image.
    async fn set_primary_image(&self, product_id: ProductId, media_id: MediaId) -> ApiResult<()>;

    async fn toggle_product_active(&self, id: ProductId) -> ApiResult<()>;

    async fn toggle_product_featured(&self, id: ProductId) -> ApiResult<()>;

    async fn create_category(&self, input: &CategoryInput) -> ApiResult<CategoryNode>;

    async fn update_category(&self, id: CategoryId, input: &CategoryInput)
    -> ApiResult<CategoryNode>;

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// [`ApiError::Conflict`] when the category still has subcategories or
    /// products; the admin UI pre-checks this but the server is
    /// authoritative.
    async fn delete_category(&self, id: CategoryId) -> ApiResult<()>;

    async fn toggle_category_active(&self, id: CategoryId) -> ApiResult<()>;

    /// List offers with their owning product summaries embedded.
    async fn list_offers(&self, page: u32) -> ApiResult<Page<Offer>>;

    /// Create an offer for a product.
    ///
    /// # Errors
    ///
    /// [`ApiError::Conflict`] when the product already has a current
    /// offer, [`ApiError::Validation`] when the offer price is not below
    /// the product's list price.
    async fn create_offer(&self, product_id: ProductId, input: &OfferInput) -> ApiResult<Offer>;

    async fn update_offer(&self, id: OfferId, input: &OfferInput) -> ApiResult<Offer>;

    async fn delete_offer(&self, id: OfferId) -> ApiResult<()>;

    async fn toggle_offer_active(&self, id: OfferId) -> ApiResult<()>;
}
