//! X (Twitter) API v2 client for user and list timelines

use super::TwitterFeed;
use crate::config::TWITTER_BEARER_TOKEN_ENV;
use crate::error::{Result, StockError};
use crate::model::{FeedPost, FeedSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://api.twitter.com/2";
const UNKNOWN_AUTHOR: &str = "unknown";

// 15 requests per 15-minute window on the basic tier
const WINDOW_BURST: NonZeroU32 = match NonZeroU32::new(15) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// X API v2 client authenticated with an app bearer token
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    bearer_token: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
    #[serde(default)]
    includes: Option<Includes>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<String>,
    author_id: Option<String>,
}

impl TwitterClient {
    /// Create a new client
    pub fn new(bearer_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::MIN).allow_burst(WINDOW_BURST);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            bearer_token: bearer_token.into(),
            base_url: BASE_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Create from environment variable TWITTER_BEARER_TOKEN
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TWITTER_BEARER_TOKEN_ENV).map_err(|_| {
            StockError::ConfigError(format!(
                "{TWITTER_BEARER_TOKEN_ENV} environment variable not set"
            ))
        })?;
        Self::new(token, Duration::from_secs(30))
    }

    /// Point the client at a different API base
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        // Over budget: fail now and let the caller skip this source
        if self.rate_limiter.check().is_err() {
            return Err(StockError::RateLimitExceeded {
                provider: "X API".to_string(),
            });
        }
        debug!("X API request {}", path);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::from_status("X API", status, &body));
        }

        Ok(response.json().await?)
    }

    async fn user_id(&self, username: &str) -> Result<String> {
        let response: ApiResponse<User> = self
            .get(&format!("/users/by/username/{username}"), &[])
            .await?;

        match response.data {
            Some(user) => Ok(user.id),
            None => Err(StockError::DataUnavailable {
                symbol: format!("@{username}"),
                reason: first_error(&response.errors),
            }),
        }
    }
}

#[async_trait]
impl TwitterFeed for TwitterClient {
    async fn user_posts(&self, username: &str, limit: usize) -> Result<Vec<FeedPost>> {
        let user_id = self.user_id(username).await?;

        // The user timeline endpoint rejects max_results below 5
        let query = [
            ("max_results", limit.clamp(5, 100).to_string()),
            ("tweet.fields", "created_at,text".to_string()),
        ];
        let response: ApiResponse<Vec<Tweet>> = self
            .get(&format!("/users/{user_id}/tweets"), &query)
            .await?;

        let mut posts = user_tweets_to_posts(username, response.data.unwrap_or_default());
        posts.truncate(limit);
        Ok(posts)
    }

    async fn list_posts(&self, list_id: &str, limit: usize) -> Result<Vec<FeedPost>> {
        let query = [
            ("max_results", limit.clamp(1, 100).to_string()),
            ("tweet.fields", "created_at,text,author_id".to_string()),
            ("expansions", "author_id".to_string()),
        ];
        let response: ApiResponse<Vec<Tweet>> =
            self.get(&format!("/lists/{list_id}/tweets"), &query).await?;

        let users = response.includes.unwrap_or_default().users;
        let mut posts = list_tweets_to_posts(list_id, response.data.unwrap_or_default(), users);
        posts.truncate(limit);
        Ok(posts)
    }
}

fn first_error(errors: &[ApiError]) -> String {
    errors
        .first()
        .map_or_else(|| "no data in response".to_string(), |e| e.detail.clone())
}

/// Parse an RFC 3339 timestamp into a naive UTC instant
fn parse_created_at(tweet: &Tweet) -> Option<NaiveDateTime> {
    let raw = tweet.created_at.as_deref()?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.naive_utc()),
        Err(e) => {
            debug!("Skipping tweet {} with bad timestamp {}: {}", tweet.id, raw, e);
            None
        }
    }
}

fn user_tweets_to_posts(username: &str, tweets: Vec<Tweet>) -> Vec<FeedPost> {
    tweets
        .into_iter()
        .filter_map(|tweet| {
            let created_at = parse_created_at(&tweet)?;
            Some(FeedPost {
                source: FeedSource::Twitter,
                source_name: format!("@{username}"),
                author: username.to_string(),
                url: format!("https://twitter.com/{username}/status/{}", tweet.id),
                text: tweet.text,
                created_at,
            })
        })
        .collect()
}

fn list_tweets_to_posts(list_id: &str, tweets: Vec<Tweet>, users: Vec<User>) -> Vec<FeedPost> {
    let usernames: HashMap<String, String> =
        users.into_iter().map(|u| (u.id, u.username)).collect();

    tweets
        .into_iter()
        .filter_map(|tweet| {
            let created_at = parse_created_at(&tweet)?;
            let author = tweet
                .author_id
                .as_ref()
                .and_then(|id| usernames.get(id))
                .map_or(UNKNOWN_AUTHOR, String::as_str)
                .to_string();
            Some(FeedPost {
                source: FeedSource::TwitterList,
                source_name: format!("List {list_id}"),
                url: format!("https://twitter.com/{author}/status/{}", tweet.id),
                author,
                text: tweet.text,
                created_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_user_tweets_to_posts() {
        let response: ApiResponse<Vec<Tweet>> = serde_json::from_value(json!({
            "data": [
                {"id": "1801", "text": "Buying more $TSLA", "created_at": "2025-01-02T15:04:05.000Z"},
                {"id": "1802", "text": "no timestamp"}
            ],
            "meta": {"result_count": 2}
        }))
        .unwrap();

        let posts = user_tweets_to_posts("elonmusk", response.data.unwrap());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].source, FeedSource::Twitter);
        assert_eq!(posts[0].source_name, "@elonmusk");
        assert_eq!(posts[0].author, "elonmusk");
        assert_eq!(posts[0].url, "https://twitter.com/elonmusk/status/1801");
        assert_eq!(
            posts[0].created_at,
            NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(15, 4, 5)
                .unwrap()
        );
    }

    #[test]
    fn test_list_tweets_resolve_authors() {
        let response: ApiResponse<Vec<Tweet>> = serde_json::from_value(json!({
            "data": [
                {"id": "9", "text": "a", "author_id": "100", "created_at": "2025-01-02T10:00:00.000Z"},
                {"id": "10", "text": "b", "author_id": "200", "created_at": "2025-01-02T11:00:00+02:00"}
            ],
            "includes": {"users": [{"id": "100", "username": "chartguy", "name": "Chart Guy"}]}
        }))
        .unwrap();

        let users = response.includes.unwrap_or_default().users;
        let posts = list_tweets_to_posts("42", response.data.unwrap(), users);

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].author, "chartguy");
        assert_eq!(posts[0].source_name, "List 42");
        assert_eq!(posts[0].source, FeedSource::TwitterList);
        assert_eq!(posts[1].author, "unknown");
        assert_eq!(posts[1].url, "https://twitter.com/unknown/status/10");
        // offset is normalized to UTC
        assert_eq!(posts[1].created_at.time().to_string(), "09:00:00");
    }

    #[test]
    fn test_missing_user_error_detail() {
        let response: ApiResponse<User> = serde_json::from_value(json!({
            "errors": [{"detail": "Could not find user with username: [nobody].", "title": "Not Found Error"}]
        }))
        .unwrap();
        assert!(response.data.is_none());
        assert_eq!(
            first_error(&response.errors),
            "Could not find user with username: [nobody]."
        );
        assert_eq!(first_error(&[]), "no data in response");
    }

    #[tokio::test]
    async fn test_list_posts_over_budget_fails_fast() {
        let server = StubServer::start(200, r#"{"data": []}"#).await;
        let client = TwitterClient::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url);

        for _ in 0..15 {
            assert!(client.list_posts("42", 5).await.unwrap().is_empty());
        }

        let started = std::time::Instant::now();
        let result = client.list_posts("42", 5).await;
        assert!(matches!(result, Err(StockError::RateLimitExceeded { .. })));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(server.hits(), 15);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let server = StubServer::start(503, "unavailable").await;
        let client = TwitterClient::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url);

        let err = client.user_posts("jack", 5).await.unwrap_err();
        assert!(matches!(err, StockError::ApiError(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    #[ignore = "requires TWITTER_BEARER_TOKEN and network access"]
    async fn test_live_user_posts() {
        let client = TwitterClient::from_env().unwrap();
        let posts = client.user_posts("elonmusk", 5).await.unwrap();
        assert!(posts.len() <= 5);
    }
}
