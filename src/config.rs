//! Client configuration.
//!
//! Values come from `BACKOFFICE_*` environment variables, then from the API
//! URL saved in the credential store by a previous session, then defaults.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::api::{normalize_api_url, DEFAULT_TIMEOUT};
use crate::storage::{CredentialStore, KEY_API_URL};

pub const ENV_API_URL: &str = "BACKOFFICE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "BACKOFFICE_TIMEOUT_SECS";
pub const ENV_TAX_RATE: &str = "BACKOFFICE_TAX_RATE";
pub const ENV_LOG: &str = "BACKOFFICE_LOG";
pub const ENV_LOG_DIR: &str = "BACKOFFICE_LOG_DIR";

/// Fixed POS tax rate applied to the cart subtotal.
pub const DEFAULT_TAX_RATE: f64 = 0.10;
const DEFAULT_LOG_FILTER: &str = "info,restaurant_backoffice=debug";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("back-office API URL is not configured (set BACKOFFICE_API_URL)")]
    MissingApiUrl,
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub tax_rate: f64,
    pub log_filter: String,
    pub log_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: normalize_api_url(api_url),
            request_timeout: DEFAULT_TIMEOUT,
            tax_rate: DEFAULT_TAX_RATE,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: crate::logging::default_log_dir(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok(), None)
    }

    /// Like [`from_env`](Self::from_env) but falls back to the API URL saved
    /// in the credential store.
    pub fn from_env_and_store(store: &dyn CredentialStore) -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok(), Some(store))
    }

    fn resolve(
        env: impl Fn(&str) -> Option<String>,
        store: Option<&dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_url = lookup(ENV_API_URL)
            .or_else(|| store.and_then(|s| s.get(KEY_API_URL)).map(|v| v.to_string()))
            .ok_or(ConfigError::MissingApiUrl)?;
        let mut config = Self::new(&api_url);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_TAX_RATE) {
            config.tax_rate = parse_tax_rate(&raw).ok_or(ConfigError::Invalid {
                key: ENV_TAX_RATE,
                value: raw.clone(),
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = filter;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

/// Accepts a fraction (`0.1`) or a percentage (`10%`).
fn parse_tax_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let rate = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    (rate.is_finite() && (0.0..1.0).contains(&rate)).then_some(rate)
}
