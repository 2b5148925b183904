//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLOOMCART_API_URL` - Base URL of the storefront REST backend
//!
//! ## Optional
//! - `BLOOMCART_API_TOKEN` - Bearer token for authenticated endpoints
//! - `BLOOMCART_STORAGE_DIR` - Directory for persisted client state
//!   (default: `.bloomcart` under the current directory)
//! - `BLOOMCART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".bloomcart";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST backend
    pub api_url: Url,
    /// Bearer token for authenticated endpoints, if any
    pub api_token: Option<SecretString>,
    /// Directory for persisted client state (favorites snapshots)
    pub storage_dir: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("storage_dir", &self.storage_dir)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if `BLOOMCART_API_URL` is missing or any
    /// present variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_url = required("BLOOMCART_API_URL")?;
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BLOOMCART_API_URL".to_owned(), e.to_string())
        })?;

        let api_token = optional("BLOOMCART_API_TOKEN").map(SecretString::from);

        let storage_dir = optional("BLOOMCART_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let request_timeout = match optional("BLOOMCART_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "BLOOMCART_REQUEST_TIMEOUT_SECS".to_owned(),
                        e.to_string(),
                    )
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            api_token,
            storage_dir,
            request_timeout,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig {
            api_url: Url::parse("https://shop.example.com").expect("valid url"),
            api_token: Some(SecretString::from("super-secret")),
            storage_dir: PathBuf::from(".bloomcart"),
            request_timeout: Duration::from_secs(30),
        };

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("BLOOMCART_API_URL".to_owned());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: BLOOMCART_API_URL"
        );
    }
}
