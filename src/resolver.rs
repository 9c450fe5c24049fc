//! Token price resolver
//!
//! Combines the market cache with a fiat oracle to price tokens in native
//! units or fiat. Every failure mode collapses to `0.0`; the `quote_*`
//! variants additionally report whether the price is known.

use crate::{
    cache::MarketCache,
    config::PriceConfig,
    error::ProviderError,
    provider::{FiatPriceOracle, MarketDataProvider},
    providers::{CoinGeckoOracle, SpectrumProvider},
    types::{is_native_token, ComponentHealth, PoolStats, PriceQuote, PriceUnit},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

static GLOBAL_RESOLVER: OnceCell<Arc<PriceResolver>> = OnceCell::const_new();

/// Resolves token prices in native units and fiat
///
/// # Example
/// ```no_run
/// use amm_price_sdk::PriceResolver;
///
/// # async fn example() {
/// let resolver = PriceResolver::global().await;
/// let usd = resolver.get_price_in_fiat("some-token-id").await;
/// println!("${:.4}", usd);
/// # }
/// ```
pub struct PriceResolver {
    cache: Arc<MarketCache>,
    oracle: Arc<dyn FiatPriceOracle>,
}

impl PriceResolver {
    /// Returns the process-wide resolver
    ///
    /// On first call this builds the resolver from the environment. Invalid
    /// overrides are logged and the defaults are used instead.
    ///
    /// # Panics
    /// If the HTTP clients cannot be built (no usable TLS backend).
    pub async fn global() -> Arc<Self> {
        GLOBAL_RESOLVER
            .get_or_init(|| async {
                let config = PriceConfig::from_env().unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Invalid price configuration, using defaults");
                    PriceConfig::default()
                });

                let resolver = Self::from_config(&config)
                    .expect("Failed to build HTTP clients for the price resolver");

                tracing::info!(
                    api_base_url = %config.api_base_url,
                    cache_ttl_secs = config.cache_ttl_secs,
                    fiat_currency = %config.fiat_currency,
                    "Initialized global price resolver"
                );

                Arc::new(resolver)
            })
            .await
            .clone()
    }

    /// Creates a resolver backed by Spectrum and CoinGecko
    pub fn from_config(config: &PriceConfig) -> Result<Self, ProviderError> {
        let provider = Arc::new(SpectrumProvider::with_base_url(
            &config.api_base_url,
            config.request_timeout(),
        )?);
        let oracle = Arc::new(CoinGeckoOracle::with_settings(
            &config.fiat_api_url,
            &config.fiat_currency,
            config.fiat_cache_ttl(),
            config.request_timeout(),
        )?);

        Ok(Self::with_sources(
            Arc::new(MarketCache::new(provider, config.cache_ttl())),
            oracle,
        ))
    }

    /// Creates a resolver over an existing cache and oracle
    ///
    /// This is primarily for testing with mock providers.
    pub fn with_sources(cache: Arc<MarketCache>, oracle: Arc<dyn FiatPriceOracle>) -> Self {
        Self { cache, oracle }
    }

    /// Creates a resolver over a provider and oracle with the given TTL
    pub fn with_provider(
        provider: Arc<dyn MarketDataProvider>,
        oracle: Arc<dyn FiatPriceOracle>,
        ttl: std::time::Duration,
    ) -> Self {
        Self::with_sources(Arc::new(MarketCache::new(provider, ttl)), oracle)
    }

    /// The underlying market cache
    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    /// Value of one `token_id` in native units, `0.0` if unknown
    pub async fn get_price_in_native(&self, token_id: &str) -> f64 {
        self.cache.get_price_in_native(token_id).await
    }

    /// Value of one `token_id` in fiat, `0.0` if unknown
    ///
    /// The native asset (by id or by its bridge alias) is priced straight from
    /// the oracle without consulting the market cache.
    pub async fn get_price_in_fiat(&self, token_id: &str) -> f64 {
        let native_fiat_price = self.oracle.native_fiat_price_cached().await.unwrap_or(0.0);

        if is_native_token(token_id) {
            return native_fiat_price;
        }

        self.get_price_in_native(token_id).await * native_fiat_price
    }

    /// Native price with a known flag
    pub async fn quote_in_native(&self, token_id: &str) -> PriceQuote {
        self.cache.quote_in_native(token_id).await
    }

    /// Fiat price with a known flag
    ///
    /// The quote is known only if both the oracle price and the market price
    /// are.
    pub async fn quote_in_fiat(&self, token_id: &str) -> PriceQuote {
        let native_fiat_price = self.oracle.native_fiat_price_cached().await;

        if is_native_token(token_id) {
            return PriceQuote {
                token_id: token_id.to_string(),
                unit: PriceUnit::Fiat,
                value: native_fiat_price.unwrap_or(0.0),
                known: native_fiat_price.is_some(),
                as_of: None,
            };
        }

        let native = self.cache.quote_in_native(token_id).await;
        let value = native.value * native_fiat_price.unwrap_or(0.0);

        PriceQuote {
            token_id: token_id.to_string(),
            unit: PriceUnit::Fiat,
            value,
            known: native.known && native_fiat_price.is_some() && value.is_finite(),
            as_of: native.as_of,
        }
    }

    /// Fiat prices for several tokens at once
    ///
    /// Duplicate ids collapse to one entry.
    pub async fn prices_in_fiat(&self, token_ids: &[&str]) -> HashMap<String, f64> {
        let lookups = token_ids.iter().map(|token_id| async move {
            (token_id.to_string(), self.get_price_in_fiat(token_id).await)
        });

        futures::future::join_all(lookups).await.into_iter().collect()
    }

    /// Identifier of the pair with exactly this base and quote
    pub async fn find_pair_id(&self, base_id: &str, quote_id: &str) -> Option<String> {
        self.cache.find_pair_id(base_id, quote_id).await
    }

    /// Detailed statistics for one pool
    pub async fn pool_stats(&self, pool_id: &str) -> Option<PoolStats> {
        self.cache.pool_stats(pool_id).await
    }

    /// Forces an immediate market refresh
    pub async fn refresh_now(&self) -> Result<usize, ProviderError> {
        self.cache.refresh_now().await
    }

    /// Returns the name of the fiat oracle
    pub fn oracle_name(&self) -> &'static str {
        self.oracle.oracle_name()
    }

    /// Perform a health check on the market cache
    pub async fn health_check(&self) -> ComponentHealth {
        let mut health = self.cache.health_check().await;
        health.details.insert(
            "oracle_name".to_string(),
            serde_json::json!(self.oracle_name()),
        );
        health
    }
}

impl Default for PriceResolver {
    fn default() -> Self {
        Self::from_config(&PriceConfig::default()).expect("Failed to create price resolver")
    }
}
