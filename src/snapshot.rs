//! Immutable market snapshot and the lookups derived from it

use crate::{constants::NATIVE_TOKEN_ID, types::PairStat};
use chrono::{DateTime, Utc};

/// Every pair known at the time of one successful fetch
///
/// A snapshot is never modified after construction. The cache replaces it as a
/// whole, so a reader holding one always sees a complete market list.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pairs: Vec<PairStat>,
    fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Creates a snapshot from pairs in API order
    pub fn new(pairs: Vec<PairStat>, fetched_at: DateTime<Utc>) -> Self {
        Self { pairs, fetched_at }
    }

    /// Number of pairs in the snapshot
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if the snapshot holds no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// When the snapshot was fetched
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// First pair with exactly this base and quote, in API order
    pub fn find_pair(&self, base_id: &str, quote_id: &str) -> Option<&PairStat> {
        self.pairs.iter().find(|pair| pair.matches(base_id, quote_id))
    }

    /// Value of one `token_id` in native units
    ///
    /// The API quotes (native, token) pairs as native per token, so the price
    /// is inverted. A zero `lastPrice` yields infinity.
    pub fn price_in_native(&self, token_id: &str) -> Option<f64> {
        self.find_pair(NATIVE_TOKEN_ID, token_id)
            .map(|pair| 1.0 / pair.last_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: Vec<PairStat>) -> MarketSnapshot {
        MarketSnapshot::new(pairs, Utc::now())
    }

    #[test]
    fn test_price_in_native_inverts_last_price() {
        let snap = snapshot(vec![PairStat::new(NATIVE_TOKEN_ID, "T", 4.0)]);
        assert_eq!(snap.price_in_native("T"), Some(0.25));
        assert_eq!(snap.price_in_native("other"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let snap = snapshot(vec![
            PairStat::new(NATIVE_TOKEN_ID, "T", 2.0).with_id("first"),
            PairStat::new(NATIVE_TOKEN_ID, "T", 8.0).with_id("second"),
        ]);
        assert_eq!(snap.price_in_native("T"), Some(0.5));
        assert_eq!(
            snap.find_pair(NATIVE_TOKEN_ID, "T").and_then(|p| p.id.as_deref()),
            Some("first")
        );
    }

    #[test]
    fn test_reversed_pair_is_not_used() {
        let snap = snapshot(vec![PairStat::new("T", NATIVE_TOKEN_ID, 2.0)]);
        assert_eq!(snap.price_in_native("T"), None);
        assert!(snap.find_pair(NATIVE_TOKEN_ID, "T").is_none());
    }

    #[test]
    fn test_zero_price_yields_infinity() {
        let snap = snapshot(vec![PairStat::new(NATIVE_TOKEN_ID, "T", 0.0)]);
        let price = snap.price_in_native("T").unwrap();
        assert!(price.is_infinite() && price.is_sign_positive());
    }
}
