//! Constants for the AMM price resolver
//!
//! These are the compile-time defaults. `PriceConfig::from_env` can override
//! the URLs, TTLs and timeout at runtime; the native asset identifiers are fixed.

/// How long a market snapshot is served before it is refreshed (in seconds)
pub const MARKET_CACHE_TTL_SECS: u64 = 60 * 15;

/// How long the fiat oracle caches the native asset price (in seconds)
pub const FIAT_CACHE_TTL_SECS: u64 = 300;

/// HTTP request timeout when fetching from external APIs (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Well-known identifier of the native chain asset
pub const NATIVE_TOKEN_ID: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Alternate short name for the native asset, as reported by bridge APIs
pub const NATIVE_TOKEN_ALIAS: &str = "erg";

/// Spectrum AMM API base URL
pub const SPECTRUM_API_URL: &str = "https://api.spectrum.fi/v1";

/// Endpoint listing every AMM market
pub const MARKETS_ENDPOINT: &str = "/amm/markets";

/// Endpoint prefix for per-pool statistics (`/amm/pool/{id}/stats`)
pub const POOL_ENDPOINT: &str = "/amm/pool";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko id of the native asset
pub const NATIVE_COINGECKO_ID: &str = "ergo";

/// Fiat currency the native asset is quoted in by default
pub const DEFAULT_FIAT_CURRENCY: &str = "usd";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "amm-price-sdk/0.1.0";
