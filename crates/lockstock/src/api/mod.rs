//! API clients for market data, analyst data and social feeds
//!
//! Each external service sits behind a trait so the pipeline components can be
//! driven by mocks in tests.

pub mod finnhub;
pub mod reddit;
pub mod twitter;
pub mod yahoo;

pub use finnhub::{FinnhubClient, RecommendationTrend};
pub use reddit::RedditClient;
pub use twitter::TwitterClient;
pub use yahoo::{Fundamentals, YahooFinanceClient};

use crate::error::Result;
use crate::model::{FeedPost, PricePoint};
use async_trait::async_trait;

/// User-Agent sent to sites that reject non-browser clients
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of company fundamentals and price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Raw fundamentals for a symbol
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals>;

    /// Daily closes over a lookback period such as "3mo" or "ytd"
    async fn close_history(&self, symbol: &str, period: &str) -> Result<Vec<PricePoint>>;
}

/// Source of analyst recommendation trends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalystDataProvider: Send + Sync {
    /// Recommendation trends, newest period first
    async fn recommendation_trends(&self, symbol: &str) -> Result<Vec<RecommendationTrend>>;
}

/// Reddit listing access
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedditFeed: Send + Sync {
    /// Newest posts of a subreddit
    async fn new_posts(&self, subreddit: &str, limit: usize) -> Result<Vec<FeedPost>>;
}

/// X (Twitter) timeline access
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TwitterFeed: Send + Sync {
    /// Recent posts of a user, looked up by username
    async fn user_posts(&self, username: &str, limit: usize) -> Result<Vec<FeedPost>>;

    /// Recent posts of a list
    async fn list_posts(&self, list_id: &str, limit: usize) -> Result<Vec<FeedPost>>;
}
