//! External API implementations

pub mod coingecko;
pub mod spectrum;

pub use coingecko::CoinGeckoOracle;
pub use spectrum::SpectrumProvider;
