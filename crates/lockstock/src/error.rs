//! Error types for lockstock operations

use thiserror::Error;

/// Errors raised by API clients and the source registry.
///
/// The pipeline components never surface these to their callers; they log
/// them and degrade to an empty or error-shaped result instead.
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol or argument provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Finnhub API error
    #[error("Finnhub error: {0}")]
    FinnhubError(String),

    /// Configuration error (usually a missing credential)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reading or writing the source registry failed
    #[error("Registry I/O error: {0}")]
    RegistryIo(#[from] std::io::Error),

    /// Language model call failed
    #[error(transparent)]
    Llm(#[from] lockstock_llm::LLMError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl StockError {
    /// Build an error from a non-success HTTP response status and body
    pub fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Self::RateLimitExceeded {
                provider: provider.to_string(),
            };
        }
        let snippet: String = body.chars().take(200).collect();
        Self::ApiError(format!("{provider} returned {status}: {snippet}"))
    }
}

/// Result type alias for lockstock operations
pub type Result<T> = std::result::Result<T, StockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = StockError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
    }

    #[test]
    fn test_from_status() {
        let err = StockError::from_status("Reddit", reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, StockError::RateLimitExceeded { provider } if provider == "Reddit"));

        let err = StockError::from_status(
            "Reddit",
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "oops",
        );
        assert_eq!(
            err.to_string(),
            "API error: Reddit returned 500 Internal Server Error: oops"
        );
    }

    #[test]
    fn test_llm_error_is_transparent() {
        let err: StockError = lockstock_llm::LLMError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "Invalid API key or authentication failed");
    }
}
