use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::errors::CoreError;
use crate::models::price::LastPrice;
use super::traits::QuoteFetcher;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage API source for intraday stock prices.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (`av_api_key` in the credentials file).
/// - **Endpoint**: `TIME_SERIES_INTRADAY` at 1 minute resolution; the close
///   of the most recent bar is used as the last price.
pub struct AlphaVantageFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageFetcher {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch the intraday series and pick the latest close.
    async fn request_last_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let symbol = symbol.to_uppercase();
        let resp: IntradayResponse = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol.as_str()),
                ("interval", "1min"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("Failed to parse intraday series for {symbol}: {e}"),
            })?;

        let series = resp.time_series.ok_or_else(|| CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: format!("No intraday data for {symbol}. API limit may be exceeded."),
        })?;

        latest_close(&series).ok_or_else(|| CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: format!("Empty or malformed intraday series for {symbol}"),
        })
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct IntradayResponse {
    #[serde(rename = "Time Series (1min)")]
    time_series: Option<HashMap<String, IntradayBar>>,
}

#[derive(Deserialize)]
pub(crate) struct IntradayBar {
    #[serde(rename = "4. close")]
    close: String,
}

/// Close of the bar with the greatest timestamp. Timestamps are
/// `YYYY-MM-DD HH:MM:SS`, so lexical order is chronological order.
pub(crate) fn latest_close(series: &HashMap<String, IntradayBar>) -> Option<f64> {
    series
        .iter()
        .max_by(|a, b| a.0.cmp(b.0))
        .and_then(|(_, bar)| bar.close.trim().parse().ok())
}

#[async_trait]
impl QuoteFetcher for AlphaVantageFetcher {
    fn name(&self) -> &str {
        "Alpha Vantage"
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

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: &str) -> IntradayBar {
        IntradayBar {
            close: close.to_string(),
        }
    }

    #[test]
    fn latest_close_picks_most_recent_timestamp() {
        let mut series = HashMap::new();
        series.insert("2019-03-21 15:58:00".to_string(), bar("101.5"));
        series.insert("2019-03-21 16:00:00".to_string(), bar("102.25"));
        series.insert("2019-03-21 15:59:00".to_string(), bar("99.0"));
        assert_eq!(latest_close(&series), Some(102.25));
    }

    #[test]
    fn latest_close_empty_series() {
        assert_eq!(latest_close(&HashMap::new()), None);
    }

    #[test]
    fn latest_close_unparsable() {
        let mut series = HashMap::new();
        series.insert("2019-03-21 16:00:00".to_string(), bar("n/a"));
        assert_eq!(latest_close(&series), None);
    }

    #[test]
    fn parses_api_payload() {
        let json = r#"{
            "Meta Data": {"1. Information": "Intraday (1min)"},
            "Time Series (1min)": {
                "2019-03-21 16:00:00": {"1. open": "1.0", "4. close": "12.3400"},
                "2019-03-21 15:59:00": {"1. open": "1.0", "4. close": "12.0000"}
            }
        }"#;
        let resp: IntradayResponse = serde_json::from_str(json).unwrap();
        let series = resp.time_series.unwrap();
        assert_eq!(latest_close(&series), Some(12.34));
    }

    #[test]
    fn rate_limit_payload_has_no_series() {
        let json = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        let resp: IntradayResponse = serde_json::from_str(json).unwrap();
        assert!(resp.time_series.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let fetcher = AlphaVantageFetcher::new("http://127.0.0.1:9/query", "KEY");
        assert_eq!(fetcher.fetch_last_price("ABC").await, LastPrice::Unavailable);
    }
}
