//! TTL-bounded cache of the full AMM market list
//!
//! The cache holds one [`MarketSnapshot`] and refreshes it when it is older
//! than the TTL. Refreshes are single-flight: a one-permit semaphore admits one
//! refresher at a time, and freshness is checked again once the permit is held
//! so callers that queued behind a refresh do not fetch a second time.
//!
//! Readers that find the cache fresh never touch the semaphore. The snapshot is
//! published as an `Arc` swapped under a short write lock, so a reader either
//! sees the previous list or the new one, never a mix.
//!
//! Fetch failures are logged and otherwise swallowed by the lookup accessors:
//! the previous snapshot (if any) keeps serving reads, and because the refresh
//! timestamp only moves on success, a cache that never fetched anything tries
//! again on every call.

use crate::{
    clock::{Clock, SystemClock},
    error::ProviderError,
    metrics::{FetchMetrics, MetricsCollector},
    provider::MarketDataProvider,
    snapshot::MarketSnapshot,
    types::{ComponentHealth, HealthStatus, MarketEvent, PoolStats, PriceQuote, PriceUnit},
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock, Semaphore};
use uuid::Uuid;

/// Capacity of the refresh event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<MarketSnapshot>>,
    last_refresh: Option<DateTime<Utc>>,
}

/// Cached view of every market on the DEX
///
/// # Example
/// ```no_run
/// use amm_price_sdk::{MarketCache, providers::SpectrumProvider};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(SpectrumProvider::new()?);
/// let cache = MarketCache::new(provider, Duration::from_secs(900));
/// let price = cache.get_price_in_native("some-token-id").await;
/// println!("{} native per token", price);
/// # Ok(())
/// # }
/// ```
pub struct MarketCache {
    provider: Arc<dyn MarketDataProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: RwLock<CacheState>,
    refresh_gate: Semaphore,
    metrics: Arc<MetricsCollector>,
    events: broadcast::Sender<MarketEvent>,
}

impl MarketCache {
    /// Creates an empty cache using wall-clock time
    pub fn new(provider: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self::with_clock(provider, ttl, Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by the given clock
    pub fn with_clock(
        provider: Arc<dyn MarketDataProvider>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            provider,
            clock,
            ttl,
            state: RwLock::new(CacheState::default()),
            refresh_gate: Semaphore::new(1),
            metrics,
            events,
        }
    }

    /// Makes sure the snapshot is no older than the TTL, fetching if needed
    ///
    /// Never fails: if the fetch does not succeed the current snapshot (or the
    /// lack of one) is kept.
    pub async fn ensure_fresh(&self) {
        if self.is_fresh().await {
            return;
        }

        // The semaphore is never closed, acquire only fails after close().
        let Ok(_permit) = self.refresh_gate.acquire().await else {
            return;
        };

        // Another caller may have refreshed while we waited for the permit
        if self.is_fresh().await {
            return;
        }

        if let Err(e) = self.refresh_locked().await {
            tracing::warn!(
                error = %e,
                provider = self.provider.provider_name(),
                "Market refresh failed, keeping previous snapshot"
            );
        }
    }

    /// Forces an immediate refresh, ignoring the TTL
    ///
    /// Waits for any in-flight refresh first.
    ///
    /// # Returns
    /// The number of pairs in the new snapshot, or the fetch error
    pub async fn refresh_now(&self) -> Result<usize, ProviderError> {
        let _permit = self
            .refresh_gate
            .acquire()
            .await
            .map_err(|e| ProviderError::ApiError(format!("refresh gate closed: {}", e)))?;

        self.refresh_locked().await
    }

    /// Fetches and swaps in a new snapshot; caller must hold the refresh permit
    async fn refresh_locked(&self) -> Result<usize, ProviderError> {
        let start = Instant::now();

        let result = match self.provider.fetch_markets().await {
            Ok(pairs) if pairs.is_empty() => Err(ProviderError::EmptyResponse(format!(
                "{} returned no markets",
                self.provider.provider_name()
            ))),
            other => other,
        };

        let pairs = match result {
            Ok(pairs) => pairs,
            Err(e) => {
                self.metrics.record_request(start.elapsed(), false).await;
                let _ = self.events.send(MarketEvent::RefreshFailed {
                    id: Uuid::new_v4(),
                    error_message: e.to_string(),
                    timestamp: self.clock.now(),
                });
                return Err(e);
            }
        };

        let now = self.clock.now();
        let pair_count = pairs.len();
        let snapshot = Arc::new(MarketSnapshot::new(pairs, now));

        let previous_pair_count = {
            let mut state = self.state.write().await;
            let previous = state.snapshot.replace(snapshot).map(|s| s.len());
            state.last_refresh = Some(now);
            previous
        };

        self.metrics.record_request(start.elapsed(), true).await;

        tracing::debug!(
            pairs = pair_count,
            provider = self.provider.provider_name(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Refreshed market snapshot"
        );

        let _ = self.events.send(MarketEvent::SnapshotRefreshed {
            id: Uuid::new_v4(),
            pair_count,
            previous_pair_count,
            timestamp: now,
        });

        Ok(pair_count)
    }

    async fn is_fresh(&self) -> bool {
        let last_refresh = self.state.read().await.last_refresh;
        self.is_fresh_at(last_refresh)
    }

    fn is_fresh_at(&self, last_refresh: Option<DateTime<Utc>>) -> bool {
        let Some(last_refresh) = last_refresh else {
            return false;
        };

        match (self.clock.now() - last_refresh).to_std() {
            Ok(age) => age < self.ttl,
            // Negative age: the clock moved backwards
            Err(_) => true,
        }
    }

    async fn current_snapshot(&self) -> Option<Arc<MarketSnapshot>> {
        self.state.read().await.snapshot.clone()
    }

    /// Value of one `token_id` in native units
    ///
    /// Returns `0.0` when no snapshot exists or the (native, token) pair is not
    /// listed. A listed pair with a zero last price yields infinity.
    pub async fn get_price_in_native(&self, token_id: &str) -> f64 {
        self.quote_in_native(token_id).await.value
    }

    /// Like [`get_price_in_native`](Self::get_price_in_native), but reports
    /// whether the value was derived from a listed pair
    pub async fn quote_in_native(&self, token_id: &str) -> PriceQuote {
        self.ensure_fresh().await;

        let Some(snapshot) = self.current_snapshot().await else {
            return PriceQuote::unknown(token_id, PriceUnit::Native);
        };

        let as_of = Some(snapshot.fetched_at());
        match snapshot.price_in_native(token_id) {
            Some(value) => PriceQuote {
                token_id: token_id.to_string(),
                unit: PriceUnit::Native,
                value,
                known: value.is_finite(),
                as_of,
            },
            None => PriceQuote {
                as_of,
                ..PriceQuote::unknown(token_id, PriceUnit::Native)
            },
        }
    }

    /// Identifier of the first pair with exactly this base and quote
    ///
    /// Reversed pairs are not considered.
    pub async fn find_pair_id(&self, base_id: &str, quote_id: &str) -> Option<String> {
        self.ensure_fresh().await;

        self.current_snapshot()
            .await?
            .find_pair(base_id, quote_id)
            .and_then(|pair| pair.id.clone())
    }

    /// Detailed statistics for one pool, fetched on every call
    pub async fn pool_stats(&self, pool_id: &str) -> Option<PoolStats> {
        match self.provider.fetch_pool_stats(pool_id).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    pool_id = pool_id,
                    provider = self.provider.provider_name(),
                    "Failed to fetch pool stats"
                );
                None
            }
        }
    }

    /// Number of pairs in the current snapshot, without refreshing
    pub async fn pair_count(&self) -> Option<usize> {
        self.current_snapshot().await.map(|s| s.len())
    }

    /// Time of the last successful refresh
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_refresh
    }

    /// True if the snapshot is missing or older than the TTL
    pub async fn is_stale(&self) -> bool {
        !self.is_fresh().await
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the name of the market data provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Subscribes to refresh events
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.events.subscribe()
    }

    /// Gets fetch metrics including latency percentiles and success rate
    pub async fn get_fetch_metrics(&self) -> FetchMetrics {
        self.metrics.get_metrics().await
    }

    /// Perform a health check on the cache
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = HashMap::new();

        let (pair_count, last_refresh) = {
            let state = self.state.read().await;
            (state.snapshot.as_ref().map(|s| s.len()), state.last_refresh)
        };
        let fresh = self.is_fresh_at(last_refresh);
        let metrics = self.get_fetch_metrics().await;

        details.insert("pair_count".to_string(), serde_json::json!(pair_count));
        details.insert(
            "last_refresh".to_string(),
            serde_json::json!(last_refresh.map(|t| t.to_rfc3339())),
        );
        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );
        details.insert(
            "ttl_secs".to_string(),
            serde_json::json!(self.ttl.as_secs()),
        );
        details.insert(
            "fetch_success_rate".to_string(),
            serde_json::json!(metrics.success_rate),
        );

        let status = match (pair_count, fresh) {
            (None, _) => HealthStatus::Unhealthy,
            (Some(_), false) => HealthStatus::Degraded,
            (Some(_), true) => HealthStatus::Healthy,
        };

        let message = match status {
            HealthStatus::Healthy => "Market cache is serving a fresh snapshot".to_string(),
            HealthStatus::Degraded => "Market cache snapshot is older than its TTL".to_string(),
            HealthStatus::Unhealthy => "Market cache has never fetched a snapshot".to_string(),
        };

        ComponentHealth {
            name: "market_cache".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: self.clock.now(),
        }
    }
}
