use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::models::price::LastPrice;

use super::alphavantage::AlphaVantageFetcher;
use super::traits::QuoteFetcher;
use super::yahoo_finance::YahooFinanceFetcher;

/// Ordered list of quote sources, usable as a single [`QuoteFetcher`].
///
/// Sources are tried in registration order; the first `Available` price
/// wins. If the primary source is down or rate limited the next one is asked.
/// New sources can be added without modifying existing code.
pub struct QuoteSourceRegistry {
    sources: Vec<Arc<dyn QuoteFetcher>>,
}

impl QuoteSourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Create a registry with the default sources.
    ///
    /// Alpha Vantage is primary when an API key is configured; Yahoo Finance
    /// (no key needed) is always registered as fallback.
    pub fn new_with_defaults(alpha_vantage_base_url: &str, alpha_vantage_api_key: &str) -> Self {
        let mut registry = Self::new();

        if !alpha_vantage_api_key.trim().is_empty() {
            registry.register(Arc::new(AlphaVantageFetcher::new(
                alpha_vantage_base_url,
                alpha_vantage_api_key,
            )));
        }

        if let Ok(yahoo) = YahooFinanceFetcher::new() {
            registry.register(Arc::new(yahoo));
        }

        registry
    }

    /// Register a new quote source at the lowest priority.
    pub fn register(&mut self, source: Arc<dyn QuoteFetcher>) {
        self.sources.push(source);
    }

    /// Names of the registered sources, in priority order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for QuoteSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteFetcher for QuoteSourceRegistry {
    fn name(&self) -> &str {
        "Quote source registry"
    }

    async fn fetch_last_price(&self, symbol: &str) -> LastPrice {
        for source in &self.sources {
            match source.fetch_last_price(symbol).await {
                LastPrice::Available(price) => return LastPrice::Available(price),
                LastPrice::Unavailable => {
                    debug!("{} has no quote for {symbol}, trying next source", source.name());
                }
            }
        }
        LastPrice::Unavailable
    }
}
