//! Configuration for the analysis pipeline and feed aggregation

use crate::error::{Result, StockError};
use lockstock_utils::var_non_empty;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable holding the OpenAI (or compatible) API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the OpenAI-compatible base URL
pub const OPENAI_API_BASE_ENV: &str = "OPENAI_API_BASE";
/// Environment variable holding the Finnhub API key
pub const FINNHUB_API_KEY_ENV: &str = "FINNHUB_API_KEY";
/// Environment variable holding the X (Twitter) bearer token
pub const TWITTER_BEARER_TOKEN_ENV: &str = "TWITTER_BEARER_TOKEN";

/// Language model backend used by the analyzer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini (default)
    #[default]
    Gemini,
    /// OpenAI or any OpenAI-compatible server
    OpenAI,
}

/// Configuration for the lockstock pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Language model backend
    pub llm_backend: LlmBackend,

    /// Model identifier passed to the backend
    pub model: String,

    /// Maximum tokens the model may generate
    pub max_tokens: usize,

    /// Sampling temperature; provider default when unset
    pub temperature: Option<f32>,

    /// Character budget for text submitted to the model
    pub max_input_chars: usize,

    /// Timeout for fetching pages in the content extractor
    pub fetch_timeout: Duration,

    /// Timeout for finance and social API requests
    pub request_timeout: Duration,

    /// Posts fetched per feed source
    pub feed_limit: usize,

    /// Default price history lookback (e.g. "3mo")
    pub history_period: String,

    /// Location of the persisted source registry
    pub sources_path: PathBuf,

    /// Finnhub requests per minute
    pub finnhub_rate_limit: u32,

    /// Gemini API key
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,

    /// OpenAI API key
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base override
    pub openai_api_base: Option<String>,

    /// Finnhub API key (analyst recommendations)
    #[serde(skip_serializing)]
    pub finnhub_api_key: Option<String>,

    /// X (Twitter) API bearer token
    #[serde(skip_serializing)]
    pub twitter_bearer_token: Option<String>,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            llm_backend: LlmBackend::Gemini,
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 8192,
            temperature: None,
            max_input_chars: 20_000,
            fetch_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            feed_limit: 5,
            history_period: "3mo".to_string(),
            sources_path: PathBuf::from("social_sources.json"),
            finnhub_rate_limit: 60,
            gemini_api_key: None,
            openai_api_key: None,
            openai_api_base: None,
            finnhub_api_key: None,
            twitter_bearer_token: None,
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Load every credential from the environment, keeping values already set
    pub fn with_env_keys(mut self) -> Self {
        self.gemini_api_key = self.gemini_api_key.or_else(|| var_non_empty(GEMINI_API_KEY_ENV));
        self.openai_api_key = self.openai_api_key.or_else(|| var_non_empty(OPENAI_API_KEY_ENV));
        self.openai_api_base = self.openai_api_base.or_else(|| var_non_empty(OPENAI_API_BASE_ENV));
        self.finnhub_api_key = self.finnhub_api_key.or_else(|| var_non_empty(FINNHUB_API_KEY_ENV));
        self.twitter_bearer_token = self
            .twitter_bearer_token
            .or_else(|| var_non_empty(TWITTER_BEARER_TOKEN_ENV));
        self
    }

    /// API key for the configured language model backend
    pub fn llm_api_key(&self) -> Result<&str> {
        let (key, env) = match self.llm_backend {
            LlmBackend::Gemini => (&self.gemini_api_key, GEMINI_API_KEY_ENV),
            LlmBackend::OpenAI => (&self.openai_api_key, OPENAI_API_KEY_ENV),
        };
        key.as_deref()
            .ok_or_else(|| StockError::ConfigError(format!("{env} not found in environment")))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StockError::ConfigError("model must not be empty".to_string()));
        }

        if self.max_input_chars == 0 {
            return Err(StockError::ConfigError(
                "max_input_chars must be greater than 0".to_string(),
            ));
        }

        if self.feed_limit == 0 || self.feed_limit > 100 {
            return Err(StockError::ConfigError(
                "feed_limit must be between 1 and 100".to_string(),
            ));
        }

        if self.finnhub_rate_limit == 0 {
            return Err(StockError::ConfigError(
                "finnhub_rate_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    llm_backend: Option<LlmBackend>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    max_input_chars: Option<usize>,
    fetch_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    feed_limit: Option<usize>,
    history_period: Option<String>,
    sources_path: Option<PathBuf>,
    finnhub_rate_limit: Option<u32>,
    gemini_api_key: Option<String>,
    finnhub_api_key: Option<String>,
    twitter_bearer_token: Option<String>,
    load_env: bool,
}

impl StockConfigBuilder {
    /// Set the language model backend
    pub fn llm_backend(mut self, backend: LlmBackend) -> Self {
        self.llm_backend = Some(backend);
        self
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the maximum generated tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the character budget for model input
    pub fn max_input_chars(mut self, chars: usize) -> Self {
        self.max_input_chars = Some(chars);
        self
    }

    /// Set the page fetch timeout
    pub fn fetch_timeout(mut self, duration: Duration) -> Self {
        self.fetch_timeout = Some(duration);
        self
    }

    /// Set the API request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set posts fetched per feed source
    pub fn feed_limit(mut self, limit: usize) -> Self {
        self.feed_limit = Some(limit);
        self
    }

    /// Set the default price history period
    pub fn history_period(mut self, period: impl Into<String>) -> Self {
        self.history_period = Some(period.into());
        self
    }

    /// Set the source registry location
    pub fn sources_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources_path = Some(path.into());
        self
    }

    /// Set the Finnhub requests-per-minute budget
    pub fn finnhub_rate_limit(mut self, per_minute: u32) -> Self {
        self.finnhub_rate_limit = Some(per_minute);
        self
    }

    /// Set the Gemini API key
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Set the Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    /// Set the X bearer token
    pub fn twitter_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.twitter_bearer_token = Some(token.into());
        self
    }

    /// Fill unset credentials from the environment at build time
    pub fn with_env_keys(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let mut config = StockConfig {
            llm_backend: self.llm_backend.unwrap_or(defaults.llm_backend),
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            max_input_chars: self.max_input_chars.unwrap_or(defaults.max_input_chars),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            feed_limit: self.feed_limit.unwrap_or(defaults.feed_limit),
            history_period: self.history_period.unwrap_or(defaults.history_period),
            sources_path: self.sources_path.unwrap_or(defaults.sources_path),
            finnhub_rate_limit: self.finnhub_rate_limit.unwrap_or(defaults.finnhub_rate_limit),
            gemini_api_key: self.gemini_api_key,
            openai_api_key: None,
            openai_api_base: None,
            finnhub_api_key: self.finnhub_api_key,
            twitter_bearer_token: self.twitter_bearer_token,
        };

        if self.load_env {
            config = config.with_env_keys();
        }

        config.validate()?;
        Ok(config)
    }
}
