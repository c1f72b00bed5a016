//! Yahoo Finance API client

use super::{BROWSER_USER_AGENT, MarketDataProvider};
use crate::error::{Result, StockError};
use crate::model::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const QUOTE_SUMMARY_MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics";

/// Raw company fundamentals, unformatted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: String,
    pub market_cap: Option<f64>,
    /// Trailing-twelve-months revenue
    pub total_revenue: Option<f64>,
    pub net_income_to_common: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

/// Yahoo Finance API client
///
/// Fundamentals come from the quoteSummary endpoint, which needs a session
/// cookie and crumb; price history goes through `yahoo_finance_api`.
pub struct YahooFinanceClient {
    client: Client,
    connector: yahoo::YahooConnector,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(Self { client, connector })
    }

    async fn crumb(&self) -> Result<String> {
        // Only sets the session cookie; this endpoint answers 404 by design
        if let Err(e) = self.client.get(COOKIE_URL).send().await {
            debug!("Yahoo cookie request failed: {}", e);
        }

        let response = self.client.get(CRUMB_URL).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::from_status("Yahoo Finance", status, &body));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(StockError::YahooFinanceError(
                "Could not obtain a session crumb".to_string(),
            ));
        }
        Ok(crumb)
    }

    /// Get historical quotes with a specific range
    async fn historical_range(&self, symbol: &str, range: &str) -> Result<Vec<PricePoint>> {
        let end = Utc::now();
        let start = range_start(range, end)?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = self
            .connector
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(quotes
            .iter()
            .filter(|q| q.close.is_finite())
            .filter_map(|q| {
                DateTime::from_timestamp(q.timestamp as i64, 0).map(|ts| PricePoint {
                    date: ts.date_naive(),
                    close: q.close,
                })
            })
            .collect())
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let crumb = self.crumb().await?;
        debug!("Fetching Yahoo quoteSummary for {}", symbol);

        let response = self
            .client
            .get(format!("{QUOTE_SUMMARY_URL}/{symbol}"))
            .query(&[("modules", QUOTE_SUMMARY_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        // quoteSummary reports unknown symbols as 404 with a JSON error body
        match serde_json::from_str::<Value>(&text) {
            Ok(body) if status.is_success() || body.pointer("/quoteSummary/error").is_some() => {
                parse_quote_summary(symbol, &body)
            }
            Ok(_) => Err(StockError::from_status("Yahoo Finance", status, &text)),
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => Err(StockError::from_status("Yahoo Finance", status, &text)),
        }
    }

    async fn close_history(&self, symbol: &str, period: &str) -> Result<Vec<PricePoint>> {
        self.historical_range(symbol, period).await
    }
}

/// Start of a lookback range ending at `end`
pub(crate) fn range_start(range: &str, end: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let days = match range {
        "1d" => 1,
        "5d" => 5,
        "1mo" => 30,
        "3mo" => 90,
        "6mo" => 180,
        "1y" => 365,
        "2y" => 730,
        "5y" => 1825,
        "10y" => 3650,
        // ~100 years
        "max" => 36500,
        "ytd" => {
            return NaiveDate::from_ymd_opt(end.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
                .ok_or_else(|| StockError::Other(format!("Invalid year: {}", end.year())));
        }
        _ => return Err(StockError::InvalidSymbol(format!("Invalid range: {range}"))),
    };
    Ok(end - chrono::Duration::days(days))
}

/// Extract fundamentals from a quoteSummary response
fn parse_quote_summary(symbol: &str, body: &Value) -> Result<Fundamentals> {
    let summary = body.get("quoteSummary").ok_or_else(|| {
        StockError::YahooFinanceError("Missing quoteSummary in response".to_string())
    })?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let reason = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(StockError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        });
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
        .ok_or_else(|| StockError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "empty quoteSummary result".to_string(),
        })?;

    // Numeric fields are wrapped as {"raw": .., "fmt": ..}; empty objects mean missing
    let raw = |module: &str, key: &str| {
        result
            .get(module)
            .and_then(|m| m.get(key))
            .and_then(|v| v.get("raw"))
            .and_then(Value::as_f64)
    };

    Ok(Fundamentals {
        symbol: symbol.to_string(),
        market_cap: raw("price", "marketCap").or_else(|| raw("summaryDetail", "marketCap")),
        total_revenue: raw("financialData", "totalRevenue"),
        net_income_to_common: raw("defaultKeyStatistics", "netIncomeToCommon"),
        trailing_pe: raw("summaryDetail", "trailingPE"),
        trailing_eps: raw("defaultKeyStatistics", "trailingEps"),
        debt_to_equity: raw("financialData", "debtToEquity"),
    })
}
