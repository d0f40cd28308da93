//! Chispa Core - Shared domain types and derivation rules.
//!
//! This crate provides the models and display rules used across both Chispa
//! front ends:
//! - `storefront` - Public-facing catalog, cart and checkout
//! - `admin` - Internal back office for products, categories and offers
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. Pricing, stock, offer-lifecycle and cart rules
//! live here exactly once so every page derives display state the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money and statuses
//! - [`catalog`] - Product, category, offer and media models
//! - [`pricing`] - Effective price, discount and savings resolution
//! - [`stock`] - Stock availability gates and labels
//! - [`cart`] - Order-preserving cart model with bounded mutations
//! - [`category`] - Category hierarchy views and breadcrumbs
//! - [`delete`] - Guards for destructive admin actions
//! - [`action`] - In-flight state for remote actions
//! - [`confirm`] - Confirmation dialog state machine
//! - [`checkout`] - Shipping data validation and order message composition

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod action;
pub mod cart;
pub mod catalog;
pub mod category;
pub mod checkout;
pub mod confirm;
pub mod delete;
pub mod pricing;
pub mod stock;
pub mod types;

pub use types::*;
