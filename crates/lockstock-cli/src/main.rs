//! Command-line front end for lockstock
//!
//! # Usage
//!
//! ```bash
//! # Credentials (or put them in a .env file)
//! export GEMINI_API_KEY="..."
//! export FINNHUB_API_KEY="..."        # optional, analyst recommendations
//! export TWITTER_BEARER_TOKEN="..."   # optional, X sources in the feed
//!
//! lockstock analyze "https://example.com/markets-today" --history
//! lockstock sources add reddit stocks
//! lockstock feed --analyze 0
//! ```

mod output;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use lockstock::{
    AnalysisResult, ContentExtractor, FinancialEnricher, LlmBackend, SentimentAnalyzer,
    SocialFeedAggregator, StockConfig,
};
use lockstock_llm::providers::GeminiProvider;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable overriding the default model
const MODEL_ENV: &str = "LOCKSTOCK_MODEL";

#[derive(Parser, Debug)]
#[command(name = "lockstock")]
#[command(about = "Market sentiment analysis with live financial data", long_about = None)]
struct Cli {
    /// Language model backend
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    /// Model identifier (default: gemini-2.5-flash, or $LOCKSTOCK_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Source registry file
    #[arg(long, global = true)]
    sources_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Gemini,
    Openai,
}

impl From<Backend> for LlmBackend {
    fn from(value: Backend) -> Self {
        match value {
            Backend::Gemini => LlmBackend::Gemini,
            Backend::Openai => LlmBackend::OpenAI,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze text or the page behind a URL
    Analyze {
        /// Free text, or an http(s)/ftp(s) URL to fetch
        input: String,
        /// Also show price history for each identified company
        #[arg(long)]
        history: bool,
        /// Lookback period for --history (default: 3mo)
        #[arg(long)]
        period: Option<String>,
        /// Also show analyst recommendations (needs FINNHUB_API_KEY)
        #[arg(long)]
        analysts: bool,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily closes for a symbol
    History {
        symbol: String,
        /// 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd or max (default: 3mo)
        #[arg(long)]
        period: Option<String>,
    },
    /// Show the latest analyst recommendation counts for a symbol
    Recommend { symbol: String },
    /// Manage social feed sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Show posts from all registered sources, newest first
    Feed {
        /// Analyze the post with this index
        #[arg(long)]
        analyze: Option<usize>,
    },
    /// List Gemini models that support generateContent
    Models,
}

#[derive(Subcommand, Debug)]
enum SourcesAction {
    /// List registered sources
    List,
    /// Register a source
    Add {
        /// reddit, twitter_users or twitter_lists
        kind: String,
        /// Subreddit name, X username or X list id
        id: String,
    },
    /// Unregister a source
    Remove { kind: String, id: String },
}

fn build_config(cli: &Cli) -> anyhow::Result<StockConfig> {
    let mut builder = StockConfig::builder().with_env_keys();
    if let Some(backend) = cli.backend {
        builder = builder.llm_backend(backend.into());
    }
    if let Some(model) = cli
        .model
        .clone()
        .or_else(|| lockstock_utils::var_non_empty(MODEL_ENV))
    {
        builder = builder.model(model);
    }
    if let Some(path) = &cli.sources_file {
        builder = builder.sources_path(path);
    }
    Ok(builder.build()?)
}

/// Explicit `--period`, else the configured default
fn resolve_period<'a>(period: Option<&'a str>, config: &'a StockConfig) -> &'a str {
    period.unwrap_or(&config.history_period)
}

async fn analyze(
    config: &StockConfig,
    input: &str,
    history: Option<&str>,
    analysts: bool,
    json: bool,
) -> anyhow::Result<()> {
    let extractor = ContentExtractor::new(config.fetch_timeout)?;
    let extraction = extractor.extract(input).await;
    let Some(text) = extraction.content else {
        bail!("{}", extraction.label);
    };
    eprintln!("{} ({} characters)", extraction.label, text.chars().count());

    let analyzer = SentimentAnalyzer::from_config(config)?;
    let result = analyzer.analyze(&text).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_analysis(&result);
    if result.is_error() {
        return Ok(());
    }

    let symbols = distinct_symbols(&result);
    let enricher = analyzer.enricher();
    if let Some(period) = history {
        for symbol in &symbols {
            print_history(enricher, symbol, period).await;
        }
    }
    if analysts && !enricher.has_analyst_data() {
        eprintln!("Analyst recommendations need FINNHUB_API_KEY");
    } else if analysts {
        for symbol in &symbols {
            print_recommendation(enricher, symbol).await;
        }
    }
    Ok(())
}

fn distinct_symbols(result: &AnalysisResult) -> Vec<String> {
    let mut seen = HashSet::new();
    result
        .stocks
        .iter()
        .filter_map(|s| s.lookup_symbol())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

fn print_analysis(result: &AnalysisResult) {
    println!("{}\n", result.summary);
    if result.stocks.is_empty() {
        println!("No companies identified.");
        return;
    }

    println!("{}", output::stocks_table(&result.stocks));
    for stock in &result.stocks {
        println!("\n{} ({}): {}", stock.name, stock.symbol, stock.sentiment);
        if !stock.reason.is_empty() {
            println!("  {}", stock.reason);
        }
        if !stock.analyst_sources.is_empty() {
            println!("  Sources: {}", stock.analyst_sources.join(", "));
        }
    }
}

async fn print_history(enricher: &FinancialEnricher, symbol: &str, period: &str) {
    match enricher.stock_history(symbol, period).await {
        Some(series) => {
            println!("\n{} closing prices ({})", symbol, series.period);
            println!("{}", output::history_table(&series));
            if let Some(change) = series.change_pct() {
                println!("Change over period: {change:+.2}%");
            }
        }
        None => println!("\nNo price history available for {symbol}"),
    }
}

async fn print_recommendation(enricher: &FinancialEnricher, symbol: &str) {
    match enricher.analyst_recommendation(symbol).await {
        Some(snapshot) => {
            println!(
                "\n{} analyst recommendations ({})",
                symbol, snapshot.period
            );
            println!("{}", output::recommendation_table(&snapshot));
        }
        None => println!("\nNo analyst recommendations available for {symbol}"),
    }
}

fn run_sources(config: &StockConfig, action: SourcesAction) -> anyhow::Result<()> {
    let mut aggregator = SocialFeedAggregator::from_config(config)
        .with_context(|| format!("Failed to open {}", config.sources_path.display()))?;

    match action {
        SourcesAction::List => {
            if aggregator.sources().is_empty() {
                println!("No sources registered.");
            } else {
                println!("{}", output::sources_table(aggregator.sources()));
            }
        }
        SourcesAction::Add { kind, id } => {
            if aggregator.add_source(&kind, &id) {
                println!("Added {kind} source {id}");
            } else {
                bail!("Could not add {kind} source {id} (unknown kind, duplicate, or write failure)");
            }
        }
        SourcesAction::Remove { kind, id } => {
            if aggregator.remove_source(&kind, &id) {
                println!("Removed {kind} source {id}");
            } else {
                bail!("Could not remove {kind} source {id} (not registered, or write failure)");
            }
        }
    }
    Ok(())
}

async fn run_feed(config: &StockConfig, analyze_index: Option<usize>) -> anyhow::Result<()> {
    let aggregator = SocialFeedAggregator::from_config(config)
        .with_context(|| format!("Failed to open {}", config.sources_path.display()))?;

    if aggregator.sources().is_empty() {
        println!("No sources registered. Add one with `lockstock sources add reddit stocks`.");
        return Ok(());
    }
    if config.twitter_bearer_token.is_none() {
        eprintln!("TWITTER_BEARER_TOKEN not set; X sources are skipped");
    }

    let posts = aggregator.get_feed().await;
    if posts.is_empty() {
        println!("No posts found.");
        return Ok(());
    }

    let Some(index) = analyze_index else {
        println!("{}", output::feed_table(&posts));
        return Ok(());
    };

    let Some(post) = posts.get(index) else {
        bail!("No post at index {index}; the feed has {} posts", posts.len());
    };
    info!("Analyzing post {} from {}", index, post.source_name);
    println!("{} by {}: {}\n", post.source_name, post.author, post.url);
    analyze(config, &post.text, None, false, false).await
}

async fn run_models(config: &StockConfig) -> anyhow::Result<()> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .context("GEMINI_API_KEY not found in environment")?;
    let provider = GeminiProvider::new(api_key)?;

    let models = provider.list_generate_models().await?;
    println!("{}", output::models_table(&models));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = lockstock_utils::load_dotenv();
    lockstock_utils::init_tracing_with_default("warn,lockstock=info");
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    debug!(model = %config.model, backend = ?config.llm_backend, "Configuration loaded");

    match cli.command {
        Commands::Analyze {
            input,
            history,
            period,
            analysts,
            json,
        } => {
            let period = resolve_period(period.as_deref(), &config);
            analyze(&config, &input, history.then_some(period), analysts, json).await
        }
        Commands::History { symbol, period } => {
            let enricher = FinancialEnricher::from_config(&config)?;
            let period = resolve_period(period.as_deref(), &config);
            print_history(&enricher, &symbol.to_uppercase(), period).await;
            Ok(())
        }
        Commands::Recommend { symbol } => {
            let enricher = FinancialEnricher::from_config(&config)?;
            if !enricher.has_analyst_data() {
                bail!("FINNHUB_API_KEY not found in environment");
            }
            print_recommendation(&enricher, &symbol.to_uppercase()).await;
            Ok(())
        }
        Commands::Sources { action } => run_sources(&config, action),
        Commands::Feed { analyze } => run_feed(&config, analyze).await,
        Commands::Models => run_models(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstock::StockRecord;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "lockstock",
            "--model",
            "gemini-2.5-pro",
            "analyze",
            "Apple beats",
            "--history",
            "--period",
            "1y",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("gemini-2.5-pro"));
        assert!(matches!(
            cli.command,
            Commands::Analyze { history: true, ref period, json: false, .. }
                if period.as_deref() == Some("1y")
        ));

        let cli = Cli::try_parse_from(["lockstock", "sources", "add", "reddit", "stocks"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sources { action: SourcesAction::Add { ref kind, ref id } }
                if kind == "reddit" && id == "stocks"
        ));

        let cli = Cli::try_parse_from(["lockstock", "feed", "--analyze", "2", "--backend", "openai"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Feed { analyze: Some(2) }));
        assert!(matches!(cli.backend, Some(Backend::Openai)));
    }

    #[test]
    fn test_period_falls_back_to_config() {
        let config = StockConfig::builder().history_period("6mo").build().unwrap();

        let cli = Cli::try_parse_from(["lockstock", "history", "AAPL"]).unwrap();
        let Commands::History { period, .. } = cli.command else {
            panic!("expected history command");
        };
        assert_eq!(period, None);
        assert_eq!(resolve_period(period.as_deref(), &config), "6mo");
        assert_eq!(resolve_period(Some("1y"), &config), "1y");
        assert_eq!(
            resolve_period(None, &StockConfig::default()),
            "3mo"
        );
    }

    #[test]
    fn test_distinct_symbols() {
        let result = AnalysisResult {
            summary: "s".to_string(),
            stocks: vec![
                StockRecord::new("AAPL", "Apple"),
                StockRecord::new("", "Unlisted"),
                StockRecord::new(" AAPL", "Apple Inc."),
                StockRecord::new("MSFT", "Microsoft"),
            ],
        };
        assert_eq!(distinct_symbols(&result), vec!["AAPL", "MSFT"]);
    }
}
