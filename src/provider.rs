//! Provider abstractions for the external APIs the resolver depends on

use crate::{
    error::ProviderError,
    types::{PairStat, PoolStats},
};
use async_trait::async_trait;

/// Trait for AMM market data providers
///
/// Implementations fetch the full market list and per-pool statistics from a
/// DEX API (Spectrum, or a mock in tests).
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches every market known to the API
    ///
    /// # Returns
    /// The pairs in the order the API returned them, or an error if the fetch
    /// fails or yields nothing
    async fn fetch_markets(&self) -> Result<Vec<PairStat>, ProviderError>;

    /// Fetches detailed statistics for a single pool
    ///
    /// # Arguments
    /// * `pool_id` - Identifier of the pool
    async fn fetch_pool_stats(&self, pool_id: &str) -> Result<PoolStats, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Trait for oracles pricing the native asset in fiat
///
/// Implementations do their own caching; the resolver calls this on every
/// fiat lookup.
#[async_trait]
pub trait FiatPriceOracle: Send + Sync {
    /// Current fiat price of one native unit, or `None` if unavailable
    async fn native_fiat_price_cached(&self) -> Option<f64>;

    /// Returns the name of this oracle
    fn oracle_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock market data provider for testing
    pub struct MockMarketProvider {
        markets: Arc<Mutex<Result<Vec<PairStat>, String>>>,
        pool_stats: Arc<Mutex<Option<PoolStats>>>,
        delay: Arc<Mutex<Duration>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl Default for MockMarketProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockMarketProvider {
        pub fn new() -> Self {
            Self {
                markets: Arc::new(Mutex::new(Err("no markets scripted".to_string()))),
                pool_stats: Arc::new(Mutex::new(None)),
                delay: Arc::new(Mutex::new(Duration::ZERO)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn with_markets(markets: Vec<PairStat>) -> Self {
            let provider = Self::new();
            provider.set_markets(markets);
            provider
        }

        pub fn set_markets(&self, markets: Vec<PairStat>) {
            *self.markets.lock().unwrap() = Ok(markets);
        }

        pub fn set_error(&self, message: &str) {
            *self.markets.lock().unwrap() = Err(message.to_string());
        }

        pub fn set_pool_stats(&self, stats: PoolStats) {
            *self.pool_stats.lock().unwrap() = Some(stats);
        }

        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = delay;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockMarketProvider {
        async fn fetch_markets(&self) -> Result<Vec<PairStat>, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let delay = *self.delay.lock().unwrap();
            let response = self.markets.lock().unwrap().clone();

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match response {
                Ok(markets) if markets.is_empty() => Err(ProviderError::EmptyResponse(
                    "No markets returned".to_string(),
                )),
                Ok(markets) => Ok(markets),
                Err(message) => Err(ProviderError::ApiError(message)),
            }
        }

        async fn fetch_pool_stats(&self, pool_id: &str) -> Result<PoolStats, ProviderError> {
            self.pool_stats
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ProviderError::ApiError(format!("HTTP 404: pool {}", pool_id)))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    /// Mock fiat oracle for testing
    pub struct MockFiatOracle {
        price: Arc<Mutex<Option<f64>>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockFiatOracle {
        pub fn new(price: Option<f64>) -> Self {
            Self {
                price: Arc::new(Mutex::new(price)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_price(&self, price: Option<f64>) {
            *self.price.lock().unwrap() = price;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl FiatPriceOracle for MockFiatOracle {
        async fn native_fiat_price_cached(&self) -> Option<f64> {
            *self.call_count.lock().unwrap() += 1;
            *self.price.lock().unwrap()
        }

        fn oracle_name(&self) -> &'static str {
            "mock"
        }
    }
}
