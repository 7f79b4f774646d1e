//! Gateway connection settings loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Problems found while validating loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required value was not supplied.
    #[error("{name} must be set")]
    Missing {
        /// Environment variable name.
        name: &'static str,
    },
    /// The endpoint is not an absolute http(s) URL.
    #[error("SUPABASE_URL is not a valid http(s) URL: {reason}")]
    InvalidUrl {
        /// Why parsing failed.
        reason: String,
    },
}

/// Connection values for the hosted backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SUPABASE")]
pub struct GatewaySettings {
    /// Project base URL, for example `https://abc.supabase.co`.
    pub url: Option<String>,
    /// Public anonymous key sent as `apikey`.
    pub anon_key: Option<String>,
    /// Transport timeout applied to every request.
    pub request_timeout_secs: Option<u64>,
}

impl GatewaySettings {
    /// Parse the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when unset and
    /// [`ConfigError::InvalidUrl`] when it is not an absolute http(s) URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(ConfigError::Missing {
                name: "SUPABASE_URL",
            })?;
        let url = Url::parse(raw).map_err(|err| ConfigError::InvalidUrl {
            reason: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidUrl {
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }

    /// The anonymous key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when unset or blank.
    pub fn anon_key(&self) -> Result<&str, ConfigError> {
        self.anon_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing {
                name: "SUPABASE_ANON_KEY",
            })
    }

    /// Configured timeout, defaulting to thirty seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}
