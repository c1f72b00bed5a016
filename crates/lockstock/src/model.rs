//! Data types shared by the analyzer, enricher and feed aggregator

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder used for every enrichment field that could not be filled
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Sentiment the model attached to a company
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
    /// The model gave no sentiment
    #[default]
    Unknown,
    /// Free-text sentiment that is none of the above
    Other(String),
}

impl From<String> for Sentiment {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "bullish" => Self::Bullish,
            "bearish" => Self::Bearish,
            "neutral" => Self::Neutral,
            "" | "n/a" => Self::Unknown,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl From<Sentiment> for String {
    fn from(value: Sentiment) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => f.write_str("Bullish"),
            Self::Bearish => f.write_str("Bearish"),
            Self::Neutral => f.write_str("Neutral"),
            Self::Unknown => f.write_str(NOT_AVAILABLE),
            Self::Other(text) => f.write_str(text),
        }
    }
}

/// Valuation ratios attached by the enricher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRatios {
    #[serde(rename = "P_E_Ratio")]
    pub pe_ratio: String,
    #[serde(rename = "EPS")]
    pub eps: String,
    #[serde(rename = "Debt_to_Equity")]
    pub debt_to_equity: String,
}

impl Default for FinancialRatios {
    fn default() -> Self {
        Self {
            pe_ratio: not_available(),
            eps: not_available(),
            debt_to_equity: not_available(),
        }
    }
}

/// Formatted metrics produced by the enricher for one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMetrics {
    pub market_cap: String,
    /// Trailing-twelve-months revenue
    pub revenue: String,
    pub net_income: String,
    pub ratios: FinancialRatios,
}

impl Default for StockMetrics {
    fn default() -> Self {
        Self {
            market_cap: not_available(),
            revenue: not_available(),
            net_income: not_available(),
            ratios: FinancialRatios::default(),
        }
    }
}

/// One company identified in the analysed content.
///
/// Serialized with the field names of the model contract. Enrichment fields
/// are never read from the model; they start as "N/A" and are filled by
/// [`StockRecord::merge_metrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "Symbol", default, deserialize_with = "lenient_string")]
    pub symbol: String,
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Sentiment", default, deserialize_with = "lenient_sentiment")]
    pub sentiment: Sentiment,
    #[serde(rename = "Reason", default, deserialize_with = "lenient_string")]
    pub reason: String,
    #[serde(rename = "Analyst_Sources", default, deserialize_with = "string_list")]
    pub analyst_sources: Vec<String>,
    #[serde(rename = "Market_Cap", skip_deserializing, default = "not_available")]
    pub market_cap: String,
    /// Kept under its historical name; the value is trailing-twelve-months revenue
    #[serde(rename = "Revenue_LQ", skip_deserializing, default = "not_available")]
    pub revenue: String,
    #[serde(rename = "Net_Income_LQ", skip_deserializing, default = "not_available")]
    pub net_income: String,
    #[serde(rename = "Financial_Ratios", skip_deserializing)]
    pub financial_ratios: FinancialRatios,
}

impl StockRecord {
    /// Create a record with every enrichment field set to "N/A"
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sentiment: Sentiment::default(),
            reason: String::new(),
            analyst_sources: Vec::new(),
            market_cap: not_available(),
            revenue: not_available(),
            net_income: not_available(),
            financial_ratios: FinancialRatios::default(),
        }
    }

    /// Overwrite the enrichment fields; analyzer-derived fields are untouched
    pub fn merge_metrics(&mut self, metrics: &StockMetrics) {
        self.market_cap.clone_from(&metrics.market_cap);
        self.revenue.clone_from(&metrics.revenue);
        self.net_income.clone_from(&metrics.net_income);
        self.financial_ratios.clone_from(&metrics.ratios);
    }

    /// Trimmed symbol, `None` when the model left it blank
    pub fn lookup_symbol(&self) -> Option<&str> {
        Some(self.symbol.trim()).filter(|s| !s.is_empty())
    }
}

/// Output of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Markdown summary, or the error message when analysis failed
    pub summary: String,
    #[serde(default)]
    pub stocks: Vec<StockRecord>,
}

impl AnalysisResult {
    /// Prefix carried by the summary of a failed analysis
    pub const ERROR_PREFIX: &'static str = "Error analyzing text: ";

    /// Error-shaped result with an empty stock list
    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            summary: format!("{}{message}", Self::ERROR_PREFIX),
            stocks: Vec::new(),
        }
    }

    /// Whether this result carries an error instead of an analysis
    pub fn is_error(&self) -> bool {
        self.summary.starts_with(Self::ERROR_PREFIX) && self.stocks.is_empty()
    }
}

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Chronological close prices for a lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub period: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Percentage change from the first to the last close
    pub fn change_pct(&self) -> Option<f64> {
        let first = self.points.first()?.close;
        let last = self.points.last()?.close;
        (first != 0.0).then(|| (last - first) / first * 100.0)
    }
}

/// Analyst recommendation counts for the most recent reporting period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSnapshot {
    pub symbol: String,
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl RecommendationSnapshot {
    /// Bucket labels and counts, strongest buy first
    pub fn buckets(&self) -> [(&'static str, u32); 5] {
        [
            ("Strong Buy", self.strong_buy),
            ("Buy", self.buy),
            ("Hold", self.hold),
            ("Sell", self.sell),
            ("Strong Sell", self.strong_sell),
        ]
    }

    pub fn total(&self) -> u32 {
        self.buckets().iter().map(|(_, n)| n).sum()
    }
}

/// Platform a feed post came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedSource {
    Reddit,
    Twitter,
    #[serde(rename = "Twitter List")]
    TwitterList,
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reddit => "Reddit",
            Self::Twitter => "Twitter",
            Self::TwitterList => "Twitter List",
        })
    }
}

/// A social-media item normalized across platforms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub source: FeedSource,
    pub source_name: String,
    pub author: String,
    pub text: String,
    pub url: String,
    /// UTC instant with the offset stripped
    pub created_at: NaiveDateTime,
}

// ============================================================================
// Lenient deserializers for model output
// ============================================================================

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(value_to_string)
}

fn lenient_sentiment<'de, D>(deserializer: D) -> Result<Sentiment, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(Sentiment::from)
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let items = match value {
        serde_json::Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        serde_json::Value::Null => Vec::new(),
        other => vec![value_to_string(other)],
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
