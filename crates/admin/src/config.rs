//! Admin panel configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHISPA_API_BASE_URL` - Base URL of the Data API
//! - `CHISPA_API_TOKEN` - Bearer token for the Data API
//!
//! ## Optional
//! - `CHISPA_API_TIMEOUT_SECONDS` - Request timeout in seconds (default: 30)
//! - `CHISPA_ADMIN_PAGE_SIZE` - Rows per listing page (default: 15)

use chispa_client::config::{ApiConfig, ConfigError, env_or_default};

/// Runtime configuration for the admin panel.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Data API connection settings.
    pub api: ApiConfig,
    /// Rows per page in the listing tables.
    pub page_size: u32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api = ApiConfig::from_env()?;
        let page_size = env_or_default("CHISPA_ADMIN_PAGE_SIZE", "15")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CHISPA_ADMIN_PAGE_SIZE".to_string(), e.to_string())
            })?;

        Ok(Self { api, page_size })
    }
}
