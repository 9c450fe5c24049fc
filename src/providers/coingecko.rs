//! CoinGecko fiat price oracle implementation

use crate::{
    clock::{Clock, SystemClock},
    constants::{
        COINGECKO_API_URL, COINGECKO_SIMPLE_PRICE_ENDPOINT, DEFAULT_FIAT_CURRENCY,
        FIAT_CACHE_TTL_SECS, NATIVE_COINGECKO_ID, REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::ProviderError,
    provider::FiatPriceOracle,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct CoinGeckoResponse {
    #[serde(flatten)]
    prices: HashMap<String, HashMap<String, f64>>,
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: f64,
    fetched_at: DateTime<Utc>,
}

/// Fiat oracle pricing the native asset through CoinGecko
///
/// The last fetched price is kept for `ttl`. Concurrent callers queue on the
/// cache mutex, so at most one request is in flight. When a refresh fails the
/// last known price is returned.
pub struct CoinGeckoOracle {
    client: Client,
    base_url: String,
    coin_id: String,
    currency: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedPrice>>,
}

impl CoinGeckoOracle {
    /// Creates an oracle for the public CoinGecko API, priced in USD
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_settings(
            COINGECKO_API_URL,
            DEFAULT_FIAT_CURRENCY,
            Duration::from_secs(FIAT_CACHE_TTL_SECS),
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Creates an oracle with a custom base URL, currency, TTL and timeout
    pub fn with_settings(
        base_url: &str,
        currency: &str,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            coin_id: NATIVE_COINGECKO_ID.to_string(),
            currency: currency.to_lowercase(),
            ttl,
            clock: Arc::new(SystemClock),
            cached: Mutex::new(None),
        })
    }

    /// Replaces the clock used for TTL decisions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn build_url(&self) -> String {
        format!(
            "{}{}?ids={}&vs_currencies={}",
            self.base_url, COINGECKO_SIMPLE_PRICE_ENDPOINT, self.coin_id, self.currency
        )
    }

    /// Fetches the native asset price, bypassing the cache
    pub async fn fetch_price(&self) -> Result<f64, ProviderError> {
        let url = self.build_url();
        tracing::debug!(url = %url, "Fetching native price from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::from_request)?;

        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status, &body));
        }

        let response_text = response.text().await.map_err(ProviderError::from_request)?;

        let coingecko_response: CoinGeckoResponse = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::unparseable("CoinGecko", e, &response_text))?;

        coingecko_response
            .prices
            .get(&self.coin_id)
            .and_then(|quotes| quotes.get(&self.currency))
            .copied()
            .ok_or_else(|| {
                ProviderError::EmptyResponse(format!(
                    "No {} price for {} returned from CoinGecko",
                    self.currency, self.coin_id
                ))
            })
    }

    fn is_fresh(&self, cached: &CachedPrice) -> bool {
        match (self.clock.now() - cached.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }
}

#[async_trait]
impl FiatPriceOracle for CoinGeckoOracle {
    async fn native_fiat_price_cached(&self) -> Option<f64> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if self.is_fresh(entry) {
                return Some(entry.price);
            }
        }

        match self.fetch_price().await {
            Ok(price) => {
                *cached = Some(CachedPrice {
                    price,
                    fetched_at: self.clock.now(),
                });
                Some(price)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    currency = %self.currency,
                    "Failed to fetch native fiat price, using last known value"
                );
                cached.as_ref().map(|entry| entry.price)
            }
        }
    }

    fn oracle_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use mockito::{Matcher, Server};

    fn oracle_for(server: &Server, clock: Arc<ManualClock>) -> CoinGeckoOracle {
        CoinGeckoOracle::with_settings(
            &server.url(),
            "USD",
            Duration::from_secs(300),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_clock(clock)
    }

    fn price_query() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("ids".into(), "ergo".into()),
            Matcher::UrlEncoded("vs_currencies".into(), "usd".into()),
        ])
    }

    #[tokio::test]
    async fn test_price_is_cached_for_ttl() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_query(price_query())
            .with_status(200)
            .with_body(r#"{"ergo": {"usd": 1.25}}"#)
            .expect(2)
            .create_async()
            .await;

        let clock = Arc::new(ManualClock::default());
        let oracle = oracle_for(&server, clock.clone());

        assert_eq!(oracle.native_fiat_price_cached().await, Some(1.25));
        clock.advance_secs(299);
        assert_eq!(oracle.native_fiat_price_cached().await, Some(1.25));
        clock.advance_secs(1);
        assert_eq!(oracle.native_fiat_price_cached().await, Some(1.25));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_without_history_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/simple/price")
            .match_query(price_query())
            .with_status(500)
            .create_async()
            .await;

        let oracle = oracle_for(&server, Arc::new(ManualClock::default()));
        assert_eq!(oracle.native_fiat_price_cached().await, None);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_last_price() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/simple/price")
            .match_query(price_query())
            .with_status(200)
            .with_body(r#"{"ergo": {"usd": 0.8}}"#)
            .create_async()
            .await;

        let clock = Arc::new(ManualClock::default());
        let oracle = oracle_for(&server, clock.clone());
        assert_eq!(oracle.native_fiat_price_cached().await, Some(0.8));

        ok.remove_async().await;
        let _failing = server
            .mock("GET", "/simple/price")
            .match_query(price_query())
            .with_status(429)
            .create_async()
            .await;

        clock.advance_secs(600);
        assert_eq!(oracle.native_fiat_price_cached().await, Some(0.8));
        assert!(matches!(
            oracle.fetch_price().await,
            Err(ProviderError::RateLimitExceeded)
        ));
    }

    #[tokio::test]
    async fn test_missing_currency_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/simple/price")
            .match_query(price_query())
            .with_status(200)
            .with_body(r#"{"ergo": {"eur": 0.7}}"#)
            .create_async()
            .await;

        let oracle = oracle_for(&server, Arc::new(ManualClock::default()));
        assert!(matches!(
            oracle.fetch_price().await,
            Err(ProviderError::EmptyResponse(_))
        ));
    }
}
