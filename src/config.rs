//! Runtime configuration for the price resolver
//!
//! Defaults come from `constants`. A handful of environment variables can
//! override them:
//!
//! - `AMM_API_URL`: market data API base URL
//! - `AMM_CACHE_TTL_SECS`: market snapshot TTL
//! - `FIAT_API_URL`: CoinGecko-compatible API base URL
//! - `FIAT_CURRENCY`: fiat currency the native asset is priced in
//! - `FIAT_CACHE_TTL_SECS`: fiat price TTL
//! - `PRICE_REQUEST_TIMEOUT_SECS`: HTTP timeout for both APIs

use crate::{
    constants::{
        COINGECKO_API_URL, DEFAULT_FIAT_CURRENCY, FIAT_CACHE_TTL_SECS, MARKET_CACHE_TTL_SECS,
        REQUEST_TIMEOUT_SECS, SPECTRUM_API_URL,
    },
    error::ConfigError,
};
use std::time::Duration;

/// Configuration for the market cache and the fiat oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceConfig {
    /// Market data API base URL
    pub api_base_url: String,

    /// Market snapshot TTL in seconds
    pub cache_ttl_secs: u64,

    /// Fiat oracle API base URL
    pub fiat_api_url: String,

    /// Fiat currency code, lowercase
    pub fiat_currency: String,

    /// Fiat price TTL in seconds
    pub fiat_cache_ttl_secs: u64,

    /// HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            api_base_url: SPECTRUM_API_URL.to_string(),
            cache_ttl_secs: MARKET_CACHE_TTL_SECS,
            fiat_api_url: COINGECKO_API_URL.to_string(),
            fiat_currency: DEFAULT_FIAT_CURRENCY.to_string(),
            fiat_cache_ttl_secs: FIAT_CACHE_TTL_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl PriceConfig {
    /// Loads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their default; set keys are validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("AMM_API_URL") {
            config.api_base_url = parse_url("AMM_API_URL", &url)?;
        }
        if let Some(ttl) = lookup("AMM_CACHE_TTL_SECS") {
            config.cache_ttl_secs = parse_positive("AMM_CACHE_TTL_SECS", &ttl)?;
        }
        if let Some(url) = lookup("FIAT_API_URL") {
            config.fiat_api_url = parse_url("FIAT_API_URL", &url)?;
        }
        if let Some(currency) = lookup("FIAT_CURRENCY") {
            let currency = currency.trim().to_lowercase();
            if currency.is_empty() {
                return Err(ConfigError::invalid("FIAT_CURRENCY", "Cannot be empty"));
            }
            config.fiat_currency = currency;
        }
        if let Some(ttl) = lookup("FIAT_CACHE_TTL_SECS") {
            config.fiat_cache_ttl_secs = parse_positive("FIAT_CACHE_TTL_SECS", &ttl)?;
        }
        if let Some(timeout) = lookup("PRICE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_positive("PRICE_REQUEST_TIMEOUT_SECS", &timeout)?;
        }

        Ok(config)
    }

    /// Market snapshot TTL
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Fiat price TTL
    pub fn fiat_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fiat_cache_ttl_secs)
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_url(var: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::invalid(
            var,
            "Must start with http:// or https://",
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_positive(var: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(var, "Must be greater than zero")),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::invalid(var, e.to_string())),
    }
}
