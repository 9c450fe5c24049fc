//! # AMM Price SDK
//!
//! Resolves token prices in the native chain unit or in fiat from a DEX
//! market-data API (Spectrum) and a fiat oracle (CoinGecko).
//!
//! The full market list is fetched once and cached for a TTL (15 minutes by
//! default). Concurrent callers share a single refresh, and a failed refresh
//! keeps serving the previous snapshot.
//!
//! ## Usage
//!
//! ```no_run
//! use amm_price_sdk::PriceResolver;
//!
//! # async fn example() {
//! let resolver = PriceResolver::global().await;
//!
//! let token = "03faf2cb329f2e90d6d23b58d91bbb6c046aa143261cc21f52fbe2824bfcbf04";
//! let in_erg = resolver.get_price_in_native(token).await;
//! let in_usd = resolver.get_price_in_fiat(token).await;
//! println!("{:.6} ERG / ${:.4}", in_erg, in_usd);
//!
//! // 0.0 means "unknown"; quotes say so explicitly
//! let quote = resolver.quote_in_fiat(token).await;
//! if !quote.known {
//!     println!("no price for {}", quote.token_id);
//! }
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PriceResolver
//!     ├── FiatPriceOracle (CoinGecko, own TTL cache)
//!     └── MarketCache (TTL + single-flight refresh)
//!             ↓
//!         MarketDataProvider (Spectrum /amm/markets)
//!             ↓
//!         MarketSnapshot (immutable, swapped whole)
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod resolver;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use cache::MarketCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PriceConfig;
pub use error::{ConfigError, ProviderError};
pub use metrics::FetchMetrics;
pub use provider::{FiatPriceOracle, MarketDataProvider};
pub use resolver::PriceResolver;
pub use snapshot::MarketSnapshot;
pub use types::{
    is_native_token, ComponentHealth, HealthStatus, MarketEvent, PairStat, PoolStats, PriceQuote,
    PriceUnit,
};
