//! Spectrum AMM market data provider implementation

use crate::{
    constants::{
        MARKETS_ENDPOINT, POOL_ENDPOINT, REQUEST_TIMEOUT_SECS, SPECTRUM_API_URL, USER_AGENT,
    },
    error::ProviderError,
    provider::MarketDataProvider,
    types::{PairStat, PoolStats},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Spectrum AMM API provider
pub struct SpectrumProvider {
    client: Client,
    base_url: String,
}

impl SpectrumProvider {
    /// Creates a provider for the public Spectrum API
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(SPECTRUM_API_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a provider for a custom API base URL
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn markets_url(&self) -> String {
        format!("{}{}", self.base_url, MARKETS_ENDPOINT)
    }

    /// Stats URL for one pool; the id is always a single path segment
    fn pool_stats_url(&self, pool_id: &str) -> Result<String, ProviderError> {
        // Dot segments survive percent-encoding and are resolved by the URL parser
        if pool_id.is_empty() || pool_id == "." || pool_id == ".." {
            return Err(ProviderError::InvalidRequest(format!(
                "Invalid pool id: {:?}",
                pool_id
            )));
        }

        Ok(format!(
            "{}{}/{}/stats",
            self.base_url,
            POOL_ENDPOINT,
            urlencoding::encode(pool_id)
        ))
    }

    /// GETs `url` and parses the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        tracing::debug!(url = url, "Fetching from Spectrum");

        let response = self
            .client
            .get(url)
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

        serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::unparseable("Spectrum", e, &response_text))
    }
}

#[async_trait]
impl MarketDataProvider for SpectrumProvider {
    async fn fetch_markets(&self) -> Result<Vec<PairStat>, ProviderError> {
        let markets: Option<Vec<PairStat>> = self.get_json(&self.markets_url()).await?;

        match markets {
            Some(markets) if !markets.is_empty() => {
                tracing::debug!(pairs = markets.len(), "Fetched markets from Spectrum");
                Ok(markets)
            }
            _ => Err(ProviderError::EmptyResponse(
                "No markets returned from Spectrum".to_string(),
            )),
        }
    }

    async fn fetch_pool_stats(&self, pool_id: &str) -> Result<PoolStats, ProviderError> {
        let url = self.pool_stats_url(pool_id)?;
        self.get_json(&url).await
    }

    fn provider_name(&self) -> &'static str {
        "spectrum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NATIVE_TOKEN_ID;
    use mockito::Server;

    fn provider_for(server: &Server) -> SpectrumProvider {
        SpectrumProvider::with_base_url(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_markets() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/amm/markets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                {"id": "p1", "baseId": "0000000000000000000000000000000000000000000000000000000000000000",
                 "baseSymbol": "ERG", "quoteId": "T1", "quoteSymbol": "TKN", "lastPrice": 2.0},
                {"id": "p2", "baseId": "T1", "quoteId": "T2", "lastPrice": 0.5}
            ]"#,
            )
            .create_async()
            .await;

        let markets = provider_for(&server).fetch_markets().await.unwrap();

        mock.assert_async().await;
        assert_eq!(markets.len(), 2);
        assert!(markets[0].matches(NATIVE_TOKEN_ID, "T1"));
        assert_eq!(markets[1].id.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn test_fetch_markets_null_or_empty() {
        let mut server = Server::new_async().await;
        let _null = server
            .mock("GET", "/amm/markets")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let err = provider_for(&server).fetch_markets().await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_markets_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/amm/markets")
            .with_status(429)
            .create_async()
            .await;

        let err = provider_for(&server).fetch_markets().await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_fetch_markets_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/amm/markets")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        match provider_for(&server).fetch_markets().await {
            Err(ProviderError::ApiError(msg)) => assert!(msg.contains("maintenance")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_markets_bad_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/amm/markets")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let err = provider_for(&server).fetch_markets().await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_pool_stats() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/amm/pool/p1/stats")
            .with_status(200)
            .with_body(r#"{"id": "p1", "tvl": {"value": 99}, "yearlyFeesPercent": 1.5}"#)
            .create_async()
            .await;

        let stats = provider_for(&server).fetch_pool_stats("p1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(stats.id.as_deref(), Some("p1"));
        assert_eq!(stats.tvl.map(|t| t.value), Some(99.0));
    }

    #[tokio::test]
    async fn test_unparseable_body_error_is_bounded() {
        let body = format!("[{}", r#"{"id": "p", "lastPrice": 1.0},"#.repeat(40_000));
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/amm/markets")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let err = provider_for(&server).fetch_markets().await.unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(message.len() < 1024, "error message is {} bytes", message.len());
        assert!(message.contains(&format!("({} bytes)", body.len())));
    }

    #[tokio::test]
    async fn test_pool_id_is_escaped() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/amm/pool/a%2Fb%3Fx/stats")
            .with_status(200)
            .with_body(r#"{"id": "a/b?x"}"#)
            .create_async()
            .await;

        let stats = provider_for(&server).fetch_pool_stats("a/b?x").await.unwrap();

        mock.assert_async().await;
        assert_eq!(stats.id.as_deref(), Some("a/b?x"));
    }

    #[tokio::test]
    async fn test_dot_segment_pool_id_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let provider = provider_for(&server);
        for pool_id in ["", ".", ".."] {
            let err = provider.fetch_pool_stats(pool_id).await.unwrap_err();
            assert!(matches!(err, ProviderError::InvalidRequest(_)));
        }
        mock.assert_async().await;
    }
}
