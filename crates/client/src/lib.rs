//! Typed access to the Chispa Data API.
//!
//! The storefront and admin page controllers never speak HTTP themselves:
//! they hold one of the [`api`] trait objects, implemented in production by
//! [`http::HttpClient`] and by in-memory fakes in tests.
//!
//! # Modules
//!
//! - [`api`] - Operation traits and their input/filter records
//! - [`http`] - `reqwest`-backed implementation of all three traits
//! - [`error`] - Error taxonomy and its user-facing notice mapping
//! - [`config`] - Environment-driven client configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use api::{AdminApi, CartApi, CatalogApi};
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, Notice, NoticeKind};
pub use http::HttpClient;
