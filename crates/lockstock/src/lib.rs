//! Market sentiment extraction with financial enrichment
//!
//! This crate turns free-form text, a web page or a social post into a
//! structured view of the companies it mentions. It includes:
//!
//! - Content extraction (URL detection, page fetch, visible-text cleanup)
//! - Sentiment and entity analysis through a single LLM completion
//! - Financial enrichment from Yahoo Finance (metrics, price history) and
//!   Finnhub (analyst recommendation trends)
//! - A social feed aggregator over subreddits, X users and X lists, backed by
//!   a JSON source registry
//!
//! # Architecture
//!
//! Control flows from [`ContentExtractor`] to [`SentimentAnalyzer`], which
//! calls [`FinancialEnricher`] once per distinct symbol. The
//! [`SocialFeedAggregator`] runs independently; a post's text can be handed
//! back to the extractor. None of these components return errors from their
//! pipeline operations: failures are logged and show up as "N/A" placeholders,
//! empty collections or an error-shaped [`AnalysisResult`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lockstock::{ContentExtractor, SentimentAnalyzer, StockConfig};
//!
//! #[tokio::main]
//! async fn main() -> lockstock::Result<()> {
//!     let config = StockConfig::builder().with_env_keys().build()?;
//!
//!     let extractor = ContentExtractor::new(config.fetch_timeout)?;
//!     let analyzer = SentimentAnalyzer::from_config(&config)?;
//!
//!     let extraction = extractor.extract("https://example.com/markets").await;
//!     if let Some(text) = extraction.content {
//!         let result = analyzer.analyze(&text).await;
//!         println!("{}", result.summary);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod api;
pub mod config;
pub mod enricher;
pub mod error;
pub mod extractor;
pub mod feed;
pub mod format;
pub mod model;
pub mod prompts;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use analyzer::SentimentAnalyzer;
pub use config::{LlmBackend, StockConfig};
pub use enricher::FinancialEnricher;
pub use error::{Result, StockError};
pub use extractor::{ContentExtractor, Extraction};
pub use feed::{SocialFeedAggregator, SourceKind, SourceRegistry, SourceStore};
pub use model::{
    AnalysisResult, FeedPost, FeedSource, FinancialRatios, NOT_AVAILABLE, PricePoint,
    PriceSeries, RecommendationSnapshot, Sentiment, StockMetrics, StockRecord,
};
