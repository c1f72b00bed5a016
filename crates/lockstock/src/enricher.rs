//! Financial metrics enrichment from market-data and analyst-data providers

use crate::api::{
    AnalystDataProvider, FinnhubClient, Fundamentals, MarketDataProvider, YahooFinanceClient,
};
use crate::config::StockConfig;
use crate::error::Result;
use crate::format::{format_eps, format_large_number, format_ratio};
use crate::model::{FinancialRatios, PriceSeries, RecommendationSnapshot, StockMetrics};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Looks up metrics, price history and analyst recommendations for a symbol.
///
/// Every operation degrades to `None` on failure; the three lookups are
/// independent of each other.
#[derive(Clone)]
pub struct FinancialEnricher {
    market: Arc<dyn MarketDataProvider>,
    analyst: Option<Arc<dyn AnalystDataProvider>>,
}

impl FinancialEnricher {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        analyst: Option<Arc<dyn AnalystDataProvider>>,
    ) -> Self {
        Self { market, analyst }
    }

    /// Yahoo Finance for market data, Finnhub for analyst data when a key is configured
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let market = Arc::new(YahooFinanceClient::new(config.request_timeout)?);

        let analyst = match config.finnhub_api_key.as_deref() {
            Some(key) => {
                let client =
                    FinnhubClient::new(key, config.finnhub_rate_limit, config.request_timeout)?;
                Some(Arc::new(client) as Arc<dyn AnalystDataProvider>)
            }
            None => {
                debug!("No Finnhub key configured; analyst recommendations disabled");
                None
            }
        };

        Ok(Self::new(market, analyst))
    }

    /// Whether analyst recommendations can be looked up
    pub fn has_analyst_data(&self) -> bool {
        self.analyst.is_some()
    }

    /// Formatted metrics for `symbol`, or `None` if the lookup failed
    #[instrument(skip(self))]
    pub async fn enrich(&self, symbol: &str) -> Option<StockMetrics> {
        match self.market.fundamentals(symbol).await {
            Ok(fundamentals) => Some(format_metrics(&fundamentals)),
            Err(e) => {
                warn!("Error fetching data for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Daily closes over `period`; `None` when empty or on error
    #[instrument(skip(self))]
    pub async fn stock_history(&self, symbol: &str, period: &str) -> Option<PriceSeries> {
        match self.market.close_history(symbol, period).await {
            Ok(points) if points.is_empty() => {
                info!("No price history for {} over {}", symbol, period);
                None
            }
            Ok(points) => Some(PriceSeries {
                symbol: symbol.to_string(),
                period: period.to_string(),
                points,
            }),
            Err(e) => {
                warn!("Error fetching history for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Recommendation counts for the newest reporting period
    #[instrument(skip(self))]
    pub async fn analyst_recommendation(&self, symbol: &str) -> Option<RecommendationSnapshot> {
        let analyst = self.analyst.as_ref()?;

        let trends = match analyst.recommendation_trends(symbol).await {
            Ok(trends) => trends,
            Err(e) => {
                warn!("Error fetching recommendations for {}: {}", symbol, e);
                return None;
            }
        };

        // Finnhub returns newest first
        let latest = trends.into_iter().next()?;
        Some(RecommendationSnapshot {
            symbol: symbol.to_string(),
            period: latest.period,
            strong_buy: latest.strong_buy,
            buy: latest.buy,
            hold: latest.hold,
            sell: latest.sell,
            strong_sell: latest.strong_sell,
        })
    }
}

/// Format raw fundamentals into display metrics
pub fn format_metrics(fundamentals: &Fundamentals) -> StockMetrics {
    StockMetrics {
        market_cap: format_large_number(fundamentals.market_cap),
        revenue: format_large_number(fundamentals.total_revenue),
        net_income: format_large_number(fundamentals.net_income_to_common),
        ratios: FinancialRatios {
            pe_ratio: format_ratio(fundamentals.trailing_pe),
            eps: format_eps(fundamentals.trailing_eps),
            debt_to_equity: format_ratio(fundamentals.debt_to_equity),
        },
    }
}
