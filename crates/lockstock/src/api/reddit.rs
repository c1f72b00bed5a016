//! Reddit public listing client

use super::{BROWSER_USER_AGENT, RedditFeed};
use crate::error::{Result, StockError};
use crate::model::{FeedPost, FeedSource};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.reddit.com";
const SELFTEXT_PREVIEW_CHARS: usize = 200;

/// Client for the unauthenticated `/r/<sub>/new.json` listing
#[derive(Debug, Clone)]
pub struct RedditClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: String,
    permalink: String,
    created_utc: f64,
}

impl RedditClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RedditFeed for RedditClient {
    async fn new_posts(&self, subreddit: &str, limit: usize) -> Result<Vec<FeedPost>> {
        let url = format!("{}/r/{}/new.json", self.base_url, subreddit);
        debug!("Fetching Reddit listing {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::from_status("Reddit", status, &body));
        }

        let listing: Listing = response.json().await?;
        Ok(listing_to_posts(subreddit, listing))
    }
}

fn listing_to_posts(subreddit: &str, listing: Listing) -> Vec<FeedPost> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|child| {
            let post = child.data;
            let secs = post.created_utc.trunc();
            let nanos = ((post.created_utc - secs) * 1e9) as u32;
            let Some(created) = DateTime::from_timestamp(secs as i64, nanos) else {
                debug!("Skipping Reddit post with bad timestamp {}", post.created_utc);
                return None;
            };

            let preview: String = post.selftext.chars().take(SELFTEXT_PREVIEW_CHARS).collect();
            Some(FeedPost {
                source: FeedSource::Reddit,
                source_name: format!("r/{subreddit}"),
                author: post.author,
                text: format!("{}\n{}", post.title, preview),
                url: format!("https://reddit.com{}", post.permalink),
                created_at: created.naive_utc(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;
    use serde_json::json;

    fn listing(value: serde_json::Value) -> Listing {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_listing_to_posts() {
        let long_body = "x".repeat(500);
        let posts = listing_to_posts(
            "stocks",
            listing(json!({
                "kind": "Listing",
                "data": {"children": [
                    {"kind": "t3", "data": {
                        "title": "NVDA earnings thread",
                        "selftext": long_body,
                        "author": "trader1",
                        "permalink": "/r/stocks/comments/abc/nvda/",
                        "created_utc": 1_735_689_600.0
                    }},
                    {"kind": "t3", "data": {
                        "title": "Link post",
                        "author": "trader2",
                        "permalink": "/r/stocks/comments/def/link/",
                        "created_utc": 1_735_693_200.5
                    }}
                ]}
            })),
        );

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].source, FeedSource::Reddit);
        assert_eq!(posts[0].source_name, "r/stocks");
        assert_eq!(posts[0].author, "trader1");
        assert_eq!(posts[0].url, "https://reddit.com/r/stocks/comments/abc/nvda/");
        assert_eq!(posts[0].text, format!("NVDA earnings thread\n{}", "x".repeat(200)));
        assert_eq!(
            posts[0].created_at,
            DateTime::from_timestamp(1_735_689_600, 0).unwrap().naive_utc()
        );
        assert_eq!(posts[1].text, "Link post\n");
    }

    #[test]
    fn test_selftext_preview_counts_characters() {
        let body = "é".repeat(250);
        let posts = listing_to_posts(
            "eu",
            listing(json!({"data": {"children": [{"data": {
                "title": "t", "selftext": body, "permalink": "/p", "created_utc": 0.0
            }}]}})),
        );
        assert_eq!(posts[0].text.chars().count(), 2 + 200);
    }

    fn client_for(server: &StubServer) -> RedditClient {
        RedditClient::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url)
    }

    #[tokio::test]
    async fn test_new_posts_from_local_listing() {
        let server = StubServer::start(
            200,
            r#"{"data": {"children": [{"data": {"title": "DD on AMD", "selftext": "", "author": "trader1", "permalink": "/r/stocks/comments/abc/dd/", "created_utc": 1735689600.0}}]}}"#,
        )
        .await;

        let posts = client_for(&server).new_posts("stocks", 5).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].source_name, "r/stocks");
        assert_eq!(posts[0].url, "https://reddit.com/r/stocks/comments/abc/dd/");
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = StubServer::start(500, "oops").await;
        let err = client_for(&server).new_posts("stocks", 5).await.unwrap_err();
        assert!(matches!(err, StockError::ApiError(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_malformed_listing_is_decode_error() {
        let server = StubServer::start(200, "{not json").await;
        let err = client_for(&server).new_posts("stocks", 5).await.unwrap_err();
        assert!(matches!(err, StockError::NetworkError(ref e) if e.is_decode()));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_listing() {
        let client = RedditClient::new(Duration::from_secs(10)).unwrap();
        let posts = client.new_posts("stocks", 5).await.unwrap();
        assert!(posts.len() <= 5);
    }
}
