//! Chispa Fría public storefront.
//!
//! Page controllers for the customer-facing shop: the catalog grid with
//! search and category drill-down, the product detail page, the session
//! cart and the WhatsApp checkout. Each page owns its own display state
//! and talks to the Data API through the [`chispa_client`] traits, so
//! the rendering layer stays a thin projection of these structs.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod product;

pub use cart::CartPage;
pub use catalog::{CatalogPage, ProductCard};
pub use checkout::{CheckoutPage, WhatsAppHandoff};
pub use config::StorefrontConfig;
pub use product::ProductPage;
