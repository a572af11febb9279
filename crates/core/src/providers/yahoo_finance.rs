use async_trait::async_trait;
use tracing::warn;

use crate::errors::CoreError;
use crate::models::price::LastPrice;
use super::traits::QuoteFetcher;

/// Yahoo Finance source for stock/equity prices.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices, mutual funds.
///
/// Uses the `yahoo_finance_api` crate. The close of the latest daily bar is
/// taken as the last traded price; during market hours Yahoo keeps that bar
/// updated.
pub struct YahooFinanceFetcher {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceFetcher {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }

    async fn request_last_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let resp = self
            .connector
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to fetch latest quote for {symbol}: {e}"),
            })?;

        let quote = resp.last_quote().map_err(|e| CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: format!("No quote data for {symbol}: {e}"),
        })?;

        Ok(quote.close)
    }
}

#[async_trait]
impl QuoteFetcher for YahooFinanceFetcher {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch_last_price(&self, symbol: &str) -> LastPrice {
        match self.request_last_price(symbol).await {
            Ok(price) => LastPrice::from_price(price),
            Err(e) => {
                warn!("{}: quote for {symbol} unavailable: {e}", self.name());
                LastPrice::Unavailable
            }
        }
    }
}
