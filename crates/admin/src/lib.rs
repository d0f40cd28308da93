//! Chispa Fría back office.
//!
//! Page controllers for the admin panel: product, category and offer
//! management plus the shell around them. Every destructive action runs
//! through a client-side guard and a confirmation dialog before the
//! Data API is touched; the server response stays authoritative and
//! pages reload after each mutation rather than patching local state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod categories;
pub mod config;
pub mod form;
pub mod offers;
pub mod products;
pub mod shell;

pub use categories::{CategoriesPage, CategoryForm};
pub use config::AdminConfig;
pub use offers::{OfferForm, OffersPage};
pub use products::{ProductForm, ProductsPage};
pub use shell::{AdminShell, PreferenceStore, UiPreferences};
