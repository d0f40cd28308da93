//! Data API client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//!
//! - `CHISPA_API_BASE_URL` - Base URL of the Data API (e.g. `https://api.chispafria.cl`)
//! - `CHISPA_API_TOKEN` - Bearer token sent on every request
//!
//! ## Optional
//!
//! - `CHISPA_API_TIMEOUT_SECONDS` - Per-request timeout (default: 30)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Data API client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL of the Data API.
    pub base_url: Url,
    /// Bearer token for the Data API.
    pub token: SecretString,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let raw_base_url = get_required_env("CHISPA_API_BASE_URL")?;
        let base_url = Url::parse(&raw_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CHISPA_API_BASE_URL".to_string(), e.to_string())
        })?;

        let token = SecretString::from(get_required_env("CHISPA_API_TOKEN")?);

        let timeout_seconds = get_env_or_default("CHISPA_API_TIMEOUT_SECONDS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CHISPA_API_TIMEOUT_SECONDS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            token,
            timeout_seconds,
        })
    }

    /// Build a configuration directly, for tests and embedded hosts.
    #[must_use]
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: SecretString::from(token.into()),
            timeout_seconds: 30,
        }
    }
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read one required environment variable, shared by the front-end configs
/// layered on top of [`ApiConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] when the variable is unset.
pub fn required_env(name: &str) -> Result<String, ConfigError> {
    get_required_env(name)
}

/// Read one environment variable with a fallback.
#[must_use]
pub fn env_or_default(name: &str, default: &str) -> String {
    get_env_or_default(name, default)
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_debug_redacts_the_token() {
        let config = ApiConfig::new(
            Url::parse("https://api.chispafria.cl").unwrap(),
            "super_secret_token",
        );
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://api.chispafria.cl"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }

    #[test]
    fn test_new_applies_the_default_timeout() {
        let config = ApiConfig::new(Url::parse("http://localhost:8000").unwrap(), "t");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.token.expose_secret(), "t");
    }
}
