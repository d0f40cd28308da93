//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHISPA_API_BASE_URL` - Base URL of the Data API
//! - `CHISPA_API_TOKEN` - Bearer token for the Data API
//! - `CHISPA_WHATSAPP_PHONE` - WhatsApp number that receives orders,
//!   country code included (e.g., +56 9 1234 5678)
//!
//! ## Optional
//! - `CHISPA_API_TIMEOUT_SECONDS` - Request timeout (default: 30)

use chispa_client::config::{ApiConfig, ConfigError, required_env};

/// Runtime configuration for the storefront.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Data API connection settings.
    pub api: ApiConfig,
    /// WhatsApp number that receives composed orders.
    pub whatsapp_phone: String,
}

impl StorefrontConfig {
    /// Load the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api = ApiConfig::from_env()?;
        let whatsapp_phone = required_env("CHISPA_WHATSAPP_PHONE")?;
        Ok(Self {
            api,
            whatsapp_phone,
        })
    }

    /// The configured phone reduced to the digit form `wa.me` links use.
    #[must_use]
    pub fn whatsapp_digits(&self) -> String {
        self.whatsapp_phone
            .chars()
            .filter(char::is_ascii_digit)
            .collect()
    }
}
