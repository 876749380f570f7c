use std::{env, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::capabilities::{ValidatedUrl, MAX_TIMEOUT_MS};

pub const DEFAULT_BASE_URL: &str = "http://localhost:31234";
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_AUTH_HEADER: &str = "X-Auth-Token";

pub const BASE_URL_VAR: &str = "POTHOLE_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "POTHOLE_API_TIMEOUT_MS";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("timeout must be between 1 and 300000ms, got {0}")]
    InvalidTimeout(u64),

    #[error("auth header name cannot be empty")]
    EmptyAuthHeader,
}

/// Where the backend lives and how requests to it are authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub auth_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds a config from any variable source, falling back to defaults
    /// for missing or invalid entries.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup(BASE_URL_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| match ValidatedUrl::new(url.as_str()) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Invalid {BASE_URL_VAR} value: {e}");
                    false
                }
            })
            .unwrap_or_else(|| {
                info!("{BASE_URL_VAR} not set, using default: {DEFAULT_BASE_URL}");
                defaults.base_url.clone()
            });

        let timeout_ms = try_load(&lookup, TIMEOUT_VAR, defaults.timeout_ms)
            .filter(|ms| (1..=MAX_TIMEOUT_MS).contains(ms))
            .unwrap_or(defaults.timeout_ms);

        Self {
            base_url,
            timeout_ms,
            auth_header: defaults.auth_header,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.base_url.as_str()).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout(self.timeout_ms));
        }

        if self.auth_header.trim().is_empty() {
            return Err(ConfigError::EmptyAuthHeader);
        }

        Ok(())
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Option<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Some(default)
        }
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| warn!("Invalid {key} value: {e}"))
            .ok(),
    }
}
