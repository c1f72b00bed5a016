//! Sentiment and entity analysis with a single LLM call

use crate::config::{LlmBackend, StockConfig};
use crate::enricher::FinancialEnricher;
use crate::error::{Result, StockError};
use crate::model::{AnalysisResult, StockMetrics, StockRecord};
use crate::prompts;
use lockstock_llm::providers::{GeminiProvider, OpenAIConfig, OpenAIProvider};
use lockstock_llm::{CompletionRequest, LLMError, LLMProvider, Message, StopReason};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Model output before enrichment
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    summary: String,
    #[serde(default)]
    stocks: Option<Vec<StockRecord>>,
}

/// Asks the model for a market summary and company list, then enriches each company
pub struct SentimentAnalyzer {
    provider: Arc<dyn LLMProvider>,
    enricher: FinancialEnricher,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
    max_input_chars: usize,
}

impl SentimentAnalyzer {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        enricher: FinancialEnricher,
        config: &StockConfig,
    ) -> Self {
        Self {
            provider,
            enricher,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Build the configured LLM backend and the default enricher
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let provider = build_llm_provider(config)?;
        let enricher = FinancialEnricher::from_config(config)?;
        Ok(Self::new(provider, enricher, config))
    }

    pub fn enricher(&self) -> &FinancialEnricher {
        &self.enricher
    }

    /// Analyze `text`. Never fails: errors come back as an error-shaped result.
    #[instrument(skip(self, text), fields(provider = self.provider.name(), model = %self.model))]
    pub async fn analyze(&self, text: &str) -> AnalysisResult {
        match self.try_analyze(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Analysis failed: {}", e);
                AnalysisResult::error(e)
            }
        }
    }

    async fn try_analyze(&self, text: &str) -> Result<AnalysisResult> {
        let text = truncate_chars(text, self.max_input_chars);
        let prompt = prompts::analysis_prompt(text)?;

        let mut builder = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .json_output(true);
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        let response = self.provider.complete(builder.build()).await?;
        debug!(
            "Model replied with {} chars, {} tokens",
            response.text().len(),
            response.usage.total()
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!("Model output hit the token limit; JSON may be truncated");
        }

        let mut result = parse_analysis(response.text())?;
        self.enrich_stocks(&mut result.stocks).await;

        info!("Analysis identified {} companies", result.stocks.len());
        Ok(result)
    }

    /// Merge metrics into every record with a symbol; one lookup per distinct symbol
    async fn enrich_stocks(&self, stocks: &mut [StockRecord]) {
        let mut lookups: HashMap<String, Option<StockMetrics>> = HashMap::new();

        for record in stocks.iter_mut() {
            let Some(symbol) = record.lookup_symbol().map(str::to_string) else {
                continue;
            };

            if !lookups.contains_key(&symbol) {
                let metrics = self.enricher.enrich(&symbol).await;
                lookups.insert(symbol.clone(), metrics);
            }

            if let Some(Some(metrics)) = lookups.get(&symbol) {
                record.merge_metrics(metrics);
            }
        }
    }
}

/// Create the LLM provider selected by `config.llm_backend`
pub fn build_llm_provider(config: &StockConfig) -> Result<Arc<dyn LLMProvider>> {
    let api_key = config.llm_api_key()?;

    let provider: Arc<dyn LLMProvider> = match config.llm_backend {
        LlmBackend::Gemini => Arc::new(GeminiProvider::new(api_key)?),
        LlmBackend::OpenAI => {
            let mut openai = OpenAIConfig::new(api_key);
            if let Some(base) = &config.openai_api_base {
                openai = openai.with_api_base(base);
            }
            Arc::new(OpenAIProvider::with_config(openai)?)
        }
    };
    Ok(provider)
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse the model reply into an unenriched result
pub fn parse_analysis(reply: &str) -> Result<AnalysisResult> {
    let cleaned = strip_code_fence(reply);
    if cleaned.is_empty() {
        return Err(StockError::Llm(LLMError::EmptyResponse(
            "no JSON in model reply".to_string(),
        )));
    }

    let raw: RawAnalysis = serde_json::from_str(cleaned)?;
    Ok(AnalysisResult {
        summary: raw.summary,
        stocks: raw.stocks.unwrap_or_default(),
    })
}
