//! Finnhub API client for analyst recommendation trends

use super::AnalystDataProvider;
use crate::config::FINNHUB_API_KEY_ENV;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://finnhub.io/api/v1";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// One period of analyst recommendations as returned by Finnhub
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationTrend {
    #[serde(default)]
    pub symbol: String,
    /// Reporting period (YYYY-MM-DD)
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub strong_buy: u32,
    #[serde(default)]
    pub buy: u32,
    #[serde(default)]
    pub hold: u32,
    #[serde(default)]
    pub sell: u32,
    #[serde(default)]
    pub strong_sell: u32,
}

/// Finnhub client with client-side rate limiting
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            rate_limiter,
        })
    }

    /// Create from environment variable FINNHUB_API_KEY with the free-tier rate limit
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(FINNHUB_API_KEY_ENV).map_err(|_| {
            StockError::ConfigError(format!("{FINNHUB_API_KEY_ENV} environment variable not set"))
        })?;
        Self::new(api_key, 60, Duration::from_secs(30))
    }

    /// Point the client at a different API base
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl AnalystDataProvider for FinnhubClient {
    async fn recommendation_trends(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
        self.rate_limiter.until_ready().await;
        debug!("Fetching Finnhub recommendation trends for {}", symbol);

        let response = self
            .client
            .get(format!("{}/stock/recommendation", self.base_url))
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StockError::FinnhubError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::from_status("Finnhub", status, &body));
        }

        response
            .json::<Vec<RecommendationTrend>>()
            .await
            .map_err(|e| StockError::FinnhubError(format!("Failed to parse response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finnhub_client_creation() {
        let client = FinnhubClient::new("test_key", 60, Duration::from_secs(5)).unwrap();
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.base_url, BASE_URL);
    }

    #[test]
    fn test_trend_deserialization() {
        let raw = json!([
            {"buy": 24, "hold": 7, "period": "2025-03-01", "sell": 0,
             "strongBuy": 13, "strongSell": 0, "symbol": "AAPL"},
            {"buy": 23, "hold": 8, "period": "2025-02-01", "symbol": "AAPL"}
        ]);

        let trends: Vec<RecommendationTrend> = serde_json::from_value(raw).unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].strong_buy, 13);
        assert_eq!(trends[0].period, "2025-03-01");
        assert_eq!(trends[1].strong_sell, 0);
    }

    #[tokio::test]
    #[ignore = "requires FINNHUB_API_KEY and network access"]
    async fn test_live_recommendations() {
        let client = FinnhubClient::from_env().unwrap();
        let trends = client.recommendation_trends("AAPL").await.unwrap();
        assert!(!trends.is_empty());
    }
}
