//! Fan-out over registered social sources

use super::registry::{SourceKind, SourceRegistry, SourceStore};
use crate::api::{RedditClient, RedditFeed, TwitterClient, TwitterFeed};
use crate::config::StockConfig;
use crate::error::Result;
use crate::model::FeedPost;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Manages the source registry and collects posts from every source
pub struct SocialFeedAggregator {
    store: SourceStore,
    registry: SourceRegistry,
    reddit: Arc<dyn RedditFeed>,
    twitter: Option<Arc<dyn TwitterFeed>>,
    feed_limit: usize,
}

impl SocialFeedAggregator {
    /// Load the registry from `store`; X sources yield nothing when `twitter` is `None`
    pub fn new(
        store: SourceStore,
        reddit: Arc<dyn RedditFeed>,
        twitter: Option<Arc<dyn TwitterFeed>>,
        feed_limit: usize,
    ) -> Result<Self> {
        let registry = store.load()?;
        debug!(
            "Loaded {} sources from {}",
            registry.len(),
            store.path().display()
        );

        Ok(Self {
            store,
            registry,
            reddit,
            twitter,
            feed_limit,
        })
    }

    /// Reddit client always; X client only when a bearer token is configured
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let reddit = Arc::new(RedditClient::new(config.request_timeout)?);
        let twitter = match config.twitter_bearer_token.as_deref() {
            Some(token) => Some(
                Arc::new(TwitterClient::new(token, config.request_timeout)?) as Arc<dyn TwitterFeed>
            ),
            None => None,
        };

        Self::new(
            SourceStore::new(&config.sources_path),
            reddit,
            twitter,
            config.feed_limit,
        )
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Register `id` under `kind`.
    ///
    /// Returns `false` for an unknown kind, a blank or already registered id,
    /// or when the registry could not be written (the change is undone).
    pub fn add_source(&mut self, kind: &str, id: &str) -> bool {
        let Ok(kind) = kind.parse::<SourceKind>() else {
            debug!("Ignoring unknown source kind {}", kind);
            return false;
        };
        let id = id.trim();
        if id.is_empty() || self.registry.contains(kind, id) {
            return false;
        }

        self.registry.list_mut(kind).push(id.to_string());
        if let Err(e) = self.store.save(&self.registry) {
            warn!("Failed to save sources, reverting add of {} {}: {}", kind, id, e);
            self.registry.list_mut(kind).pop();
            return false;
        }

        info!("Added {} source {}", kind, id);
        true
    }

    /// Unregister `id` from `kind`; `false` when it was not registered or the write failed
    pub fn remove_source(&mut self, kind: &str, id: &str) -> bool {
        let Ok(kind) = kind.parse::<SourceKind>() else {
            debug!("Ignoring unknown source kind {}", kind);
            return false;
        };
        let id = id.trim();
        let Some(index) = self.registry.list(kind).iter().position(|s| s == id) else {
            return false;
        };

        let removed = self.registry.list_mut(kind).remove(index);
        if let Err(e) = self.store.save(&self.registry) {
            warn!("Failed to save sources, reverting removal of {} {}: {}", kind, id, e);
            self.registry.list_mut(kind).insert(index, removed);
            return false;
        }

        info!("Removed {} source {}", kind, id);
        true
    }

    /// Posts from every source, newest first.
    ///
    /// Sources are polled one after another; a failing source is logged and
    /// contributes nothing.
    #[instrument(skip(self), fields(sources = self.registry.len()))]
    pub async fn get_feed(&self) -> Vec<FeedPost> {
        let mut posts = Vec::new();

        for subreddit in &self.registry.reddit {
            match self.reddit.new_posts(subreddit, self.feed_limit).await {
                Ok(batch) => posts.extend(batch),
                Err(e) => warn!("Error fetching Reddit r/{}: {}", subreddit, e),
            }
        }

        if let Some(twitter) = &self.twitter {
            for username in &self.registry.twitter_users {
                match twitter.user_posts(username, self.feed_limit).await {
                    Ok(batch) => posts.extend(batch),
                    Err(e) => warn!("Error fetching Twitter user {}: {}", username, e),
                }
            }

            for list_id in &self.registry.twitter_lists {
                match twitter.list_posts(list_id, self.feed_limit).await {
                    Ok(batch) => posts.extend(batch),
                    Err(e) => warn!("Error fetching Twitter List {}: {}", list_id, e),
                }
            }
        } else if !self.registry.twitter_users.is_empty() || !self.registry.twitter_lists.is_empty()
        {
            debug!("No X bearer token configured; skipping X sources");
        }

        // Stable, so equal timestamps keep fan-out order
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        info!("Collected {} feed posts", posts.len());
        posts
    }
}
