//! Types for the AMM price resolver

use crate::constants::{NATIVE_TOKEN_ALIAS, NATIVE_TOKEN_ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returns true if `token_id` names the native chain asset
///
/// Both the all-zero identifier and the bridge alias are accepted.
pub fn is_native_token(token_id: &str) -> bool {
    token_id == NATIVE_TOKEN_ID || token_id == NATIVE_TOKEN_ALIAS
}

/// Volume descriptor attached to a market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketVolume {
    /// Raw amount traded
    #[serde(default)]
    pub value: f64,

    /// Units of the amount, as reported by the API
    #[serde(default)]
    pub units: Option<serde_json::Value>,
}

/// Statistics for one trading pair, as returned by `/amm/markets`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStat {
    /// Pair (pool) identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Identifier of the base asset
    #[serde(default)]
    pub base_id: Option<String>,

    /// Ticker of the base asset
    #[serde(default)]
    pub base_symbol: Option<String>,

    /// Identifier of the quote asset
    #[serde(default)]
    pub quote_id: Option<String>,

    /// Ticker of the quote asset
    #[serde(default)]
    pub quote_symbol: Option<String>,

    /// Last traded price, base units per quote unit
    #[serde(default)]
    pub last_price: f64,

    /// Volume traded on the base side
    #[serde(default)]
    pub base_volume: Option<MarketVolume>,

    /// Volume traded on the quote side
    #[serde(default)]
    pub quote_volume: Option<MarketVolume>,
}

impl PairStat {
    /// Create a pair with just the fields used for pricing
    pub fn new(base_id: &str, quote_id: &str, last_price: f64) -> Self {
        Self {
            base_id: Some(base_id.to_string()),
            quote_id: Some(quote_id.to_string()),
            last_price,
            ..Self::default()
        }
    }

    /// Set the pair identifier
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// True if this pair has exactly the given base and quote
    pub fn matches(&self, base_id: &str, quote_id: &str) -> bool {
        self.base_id.as_deref() == Some(base_id) && self.quote_id.as_deref() == Some(quote_id)
    }
}

/// Amount of one asset locked in a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedAsset {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
}

/// Valuation (TVL, volume, fees) reported for a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolValuation {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub units: Option<serde_json::Value>,
    #[serde(default)]
    pub window: Option<serde_json::Value>,
}

/// Per-pool statistics, as returned by `/amm/pool/{id}/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub locked_x: Option<LockedAsset>,
    #[serde(default)]
    pub locked_y: Option<LockedAsset>,
    #[serde(default)]
    pub tvl: Option<PoolValuation>,
    #[serde(default)]
    pub volume: Option<PoolValuation>,
    #[serde(default)]
    pub fees: Option<PoolValuation>,
    #[serde(default)]
    pub yearly_fees_percent: Option<f64>,
}

/// Unit a price is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    /// Native chain asset
    Native,
    /// Fiat currency of the configured oracle
    Fiat,
}

/// A price together with whether it was actually derived from data
///
/// The plain accessors return `0.0` for "unknown"; a quote keeps that value
/// but also tells the caller whether it means anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Token the quote is for
    pub token_id: String,

    /// Unit of `value`
    pub unit: PriceUnit,

    /// Price, `0.0` when unknown
    pub value: f64,

    /// False when `value` is the unknown-price fallback
    pub known: bool,

    /// Fetch time of the market snapshot used, if any
    pub as_of: Option<DateTime<Utc>>,
}

impl PriceQuote {
    /// Create a quote for an unknown price
    pub fn unknown(token_id: &str, unit: PriceUnit) -> Self {
        Self {
            token_id: token_id.to_string(),
            unit,
            value: 0.0,
            known: false,
            as_of: None,
        }
    }
}

/// Events published by the market cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketEvent {
    /// A new market snapshot replaced the previous one
    SnapshotRefreshed {
        id: Uuid,
        pair_count: usize,
        previous_pair_count: Option<usize>,
        timestamp: DateTime<Utc>,
    },

    /// A refresh attempt failed and the previous snapshot was kept
    RefreshFailed {
        id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            MarketEvent::SnapshotRefreshed { id, .. } => *id,
            MarketEvent::RefreshFailed { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            MarketEvent::SnapshotRefreshed { .. } => "SNAPSHOT_REFRESHED",
            MarketEvent::RefreshFailed { .. } => "REFRESH_FAILED",
        }
    }
}

impl std::fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketEvent::SnapshotRefreshed { pair_count, .. } => {
                write!(f, "Market snapshot refreshed: {} pairs", pair_count)
            }
            MarketEvent::RefreshFailed { error_message, .. } => {
                write!(f, "Market refresh failed: {}", error_message)
            }
        }
    }
}

/// Overall health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Snapshot present and within its TTL
    Healthy,
    /// Snapshot present but older than its TTL
    Degraded,
    /// No snapshot has ever been fetched
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
