//! Prompt template for the sentiment and entity analyzer

use crate::error::{Result, StockError};
use minijinja::{Environment, context};

/// Instruction template; `text` is the (already truncated) article content
pub const ANALYSIS_TEMPLATE: &str = r#"You are an investment manager. Analyze the following article/text and identify relevant companies (Positive/Bullish sentiment).

1. Provide a general summary of the market sentiment found in the text (Markdown format).
2. For each identified company, provide the basic details (Symbol, Name, Sentiment, Reason, Analyst Sources).

Note: DO NOT estimate financial metrics (Revenue, Market Cap, etc.). These will be fetched from an external API.

Return the result STRICTLY as a single JSON object with two keys: "summary" and "stocks".

Format:
{
    "summary": "Markdown text summary...",
    "stocks": [
        {
            "Symbol": "AAPL",
            "Name": "Apple Inc.",
            "Sentiment": "Bullish",
            "Reason": "Strong iPhone sales...",
            "Analyst_Sources": ["Goldman Sachs", "Bloomberg"]
        }
    ]
}

Article Content:
{{ text }}
"#;

/// Render the analysis prompt for `text`
pub fn analysis_prompt(text: &str) -> Result<String> {
    let env = Environment::new();
    env.render_str(ANALYSIS_TEMPLATE, context! { text => text })
        .map_err(|e| StockError::Other(format!("Failed to render analysis prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = analysis_prompt("Tesla deliveries beat estimates").unwrap();
        assert!(prompt.starts_with("You are an investment manager."));
        assert!(prompt.ends_with("Article Content:\nTesla deliveries beat estimates"));
        assert!(prompt.contains("DO NOT estimate financial metrics"));
        assert!(prompt.contains(r#""summary" and "stocks""#));
    }

    #[test]
    fn test_prompt_does_not_interpret_article_markup() {
        let prompt = analysis_prompt("{{ not_a_variable }} {% if x %}").unwrap();
        assert!(prompt.contains("{{ not_a_variable }} {% if x %}"));
    }
}
