use async_trait::async_trait;

use crate::models::price::LastPrice;

/// Trait abstraction for every source of live quotes.
///
/// Each API (Alpha Vantage, Yahoo Finance) implements this trait. If an API
/// stops working or changes, only that one implementation is replaced.
///
/// Implementations must never fail: transport errors, rate limits and
/// unparsable payloads are logged and reported as [`LastPrice::Unavailable`].
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Human-readable name of this source (for logs).
    fn name(&self) -> &str;

    /// Last traded price of `symbol`. One network call at most.
    async fn fetch_last_price(&self, symbol: &str) -> LastPrice;
}
