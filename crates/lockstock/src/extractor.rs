//! Content extraction: classify input as URL or text, fetch and clean pages

use crate::api::BROWSER_USER_AGENT;
use crate::error::{Result, StockError};
use regex::{Captures, Regex};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const LABEL_TEXT: &str = "Direct Text Input";
pub const LABEL_URL: &str = "URL Content Fetched";
pub const LABEL_EMPTY: &str = "Please provide some input.";
pub const FETCH_ERROR_PREFIX: &str = "Error fetching URL: ";

const URL_PATTERN: &str = concat!(
    r"(?i)^(?:http|ftp)s?://",
    r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|",
    r"localhost|",
    r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
    r"(?::\d+)?",
    r"(?:/?|[/?]\S+)$",
);

/// Text ready for analysis plus a human-readable status label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// `None` when the input was empty or the page could not be fetched
    pub content: Option<String>,
    pub label: String,
}

impl Extraction {
    fn failed(label: impl Into<String>) -> Self {
        Self {
            content: None,
            label: label.into(),
        }
    }
}

/// Compiled patterns for turning an HTML document into visible text
struct HtmlCleaner {
    hidden_blocks: Regex,
    comments: Regex,
    tags: Regex,
    entities: Regex,
}

impl HtmlCleaner {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| StockError::Other(format!("Invalid pattern: {e}")))
        };

        Ok(Self {
            hidden_blocks: compile(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")?,
            comments: compile(r"(?s)<!--.*?-->")?,
            tags: compile(r"(?s)<[^>]*>")?,
            entities: compile(r"&(?:#([xX][0-9a-fA-F]+|[0-9]+)|(nbsp|lt|gt|quot|apos|amp));")?,
        })
    }

    fn visible_text(&self, html: &str) -> String {
        let text = self.hidden_blocks.replace_all(html, "");
        let text = self.comments.replace_all(&text, "");
        let text = self.tags.replace_all(&text, "");
        let text = self.decode_entities(&text);

        // Double spaces separate headlines that share a line
        text.lines()
            .flat_map(|line| line.trim().split("  "))
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Decode entities in one pass so decoded text is never decoded again
    fn decode_entities(&self, text: &str) -> String {
        self.entities
            .replace_all(text, |caps: &Captures<'_>| {
                if let Some(name) = caps.get(2) {
                    let decoded = match name.as_str() {
                        "nbsp" => " ",
                        "lt" => "<",
                        "gt" => ">",
                        "quot" => "\"",
                        "apos" => "'",
                        _ => "&",
                    };
                    return decoded.to_string();
                }

                let code = &caps[1];
                let value = match code.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => code.parse().ok(),
                };
                value
                    .and_then(char::from_u32)
                    .map_or_else(|| caps[0].to_string(), String::from)
            })
            .into_owned()
    }
}

/// Turns raw user input into text for the analyzer
pub struct ContentExtractor {
    client: Client,
    url_pattern: Regex,
    cleaner: HtmlCleaner,
}

impl ContentExtractor {
    /// Create an extractor whose page fetches time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        let url_pattern = Regex::new(URL_PATTERN)
            .map_err(|e| StockError::Other(format!("Invalid URL pattern: {e}")))?;

        Ok(Self {
            client,
            url_pattern,
            cleaner: HtmlCleaner::new()?,
        })
    }

    /// Whether the trimmed input looks like an http(s) or ftp(s) URL
    pub fn is_url(&self, text: &str) -> bool {
        self.url_pattern.is_match(text)
    }

    /// Strip markup from an HTML document, one text chunk per line
    pub fn html_to_text(&self, html: &str) -> String {
        self.cleaner.visible_text(html)
    }

    /// Classify the input and return the text to analyze.
    ///
    /// Never fails: fetch errors come back as `content: None` with the
    /// reason in the label.
    #[instrument(skip(self, input), fields(len = input.len()))]
    pub async fn extract(&self, input: &str) -> Extraction {
        let input = input.trim();
        if input.is_empty() {
            return Extraction::failed(LABEL_EMPTY);
        }

        if !self.is_url(input) {
            debug!("Input treated as direct text");
            return Extraction {
                content: Some(input.to_string()),
                label: LABEL_TEXT.to_string(),
            };
        }

        match self.fetch(input).await {
            Ok(html) => {
                let text = self.html_to_text(&html);
                info!("Fetched {} ({} chars of text)", input, text.chars().count());
                Extraction {
                    content: Some(text),
                    label: LABEL_URL.to_string(),
                }
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", input, e);
                Extraction::failed(format!("{FETCH_ERROR_PREFIX}{e}"))
            }
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_url_classification() {
        let ex = extractor();
        assert!(ex.is_url("https://example.com/a"));
        assert!(ex.is_url("HTTP://Example.COM"));
        assert!(ex.is_url("http://localhost:8080"));
        assert!(ex.is_url("ftp://10.0.0.1/file"));
        assert!(ex.is_url("https://news.site.co.uk/markets?id=42&x=y"));

        assert!(!ex.is_url("example.com"));
        assert!(!ex.is_url("Apple beat earnings expectations this quarter"));
        assert!(!ex.is_url("https://example.com/has a space"));
        assert!(!ex.is_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_html_to_text_strips_hidden_content() {
        let html = r#"<html><head><title>Markets</title>
            <style>body { color: red; }</style>
            <script type="text/javascript">var x = "<b>hidden</b>";</script>
            </head>
            <body>
              <!-- nav -->
              <h1>Stocks rally</h1>
              <p>Tech  leads   gains &amp; more</p>
            </body></html>"#;

        let text = extractor().html_to_text(html);
        assert_eq!(text, "Markets\nStocks rally\nTech\nleads\ngains & more");
        assert!(!text.contains("color"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_entity_decoding() {
        let text = extractor().html_to_text("<p>AT&#38;T &lt;T&gt; &#x2014; &quot;up&quot; &amp;lt;</p>");
        assert_eq!(text, "AT&T <T> \u{2014} \"up\" &lt;");
    }

    #[test]
    fn test_entities_decoded_once() {
        let text = extractor().html_to_text("<p>Use &#38;lt;b&#38;gt; for bold</p>");
        assert_eq!(text, "Use &lt;b&gt; for bold");
        assert_eq!(extractor().html_to_text("<p>&#xZZ; &bogus;</p>"), "&#xZZ; &bogus;");
    }

    #[tokio::test]
    async fn test_extract_direct_text() {
        let extraction = extractor().extract("  NVIDIA surges on AI demand  ").await;
        assert_eq!(extraction.content.as_deref(), Some("NVIDIA surges on AI demand"));
        assert_eq!(extraction.label, LABEL_TEXT);
    }

    #[tokio::test]
    async fn test_extract_empty_input() {
        let extraction = extractor().extract("   \n").await;
        assert_eq!(extraction.content, None);
        assert_eq!(extraction.label, LABEL_EMPTY);
    }

    #[tokio::test]
    async fn test_extract_unreachable_url() {
        // Port 9 on loopback refuses connections
        let extraction = extractor().extract("http://127.0.0.1:9/").await;
        assert_eq!(extraction.content, None);
        assert!(extraction.label.starts_with(FETCH_ERROR_PREFIX));
    }

    #[tokio::test]
    async fn test_extract_not_found_page() {
        let server = StubServer::start(404, "<h1>Not Found</h1>").await;
        let extraction = extractor()
            .extract(&format!("{}/missing-article", server.base_url))
            .await;
        assert_eq!(extraction.content, None);
        assert!(extraction.label.starts_with(FETCH_ERROR_PREFIX));
        assert!(extraction.label.contains("404"));
    }

    #[tokio::test]
    async fn test_extract_page_text() {
        let server = StubServer::start(200, "<html><body><h1>Stocks rally</h1></body></html>").await;
        let extraction = extractor().extract(&server.base_url).await;
        assert_eq!(extraction.content.as_deref(), Some("Stocks rally"));
        assert_eq!(extraction.label, LABEL_URL);
    }
}
