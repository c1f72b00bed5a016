//! Table rendering for CLI output

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use lockstock::{
    FeedPost, PriceSeries, RecommendationSnapshot, SourceKind, SourceRegistry, StockRecord,
};
use lockstock_llm::providers::GeminiModel;

const PREVIEW_CHARS: usize = 80;

fn new_table<I, T>(header: I) -> Table
where
    I: IntoIterator<Item = T>,
    T: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// First line of `text`, cut to a preview length
pub fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

pub fn stocks_table(stocks: &[StockRecord]) -> Table {
    let mut table = new_table([
        "Symbol",
        "Name",
        "Sentiment",
        "Market Cap",
        "Revenue (TTM)",
        "Net Income",
        "P/E",
        "EPS",
        "Debt/Equity",
    ]);
    for stock in stocks {
        table.add_row(vec![
            Cell::new(&stock.symbol),
            Cell::new(&stock.name),
            Cell::new(&stock.sentiment),
            right(&stock.market_cap),
            right(&stock.revenue),
            right(&stock.net_income),
            right(&stock.financial_ratios.pe_ratio),
            right(&stock.financial_ratios.eps),
            right(&stock.financial_ratios.debt_to_equity),
        ]);
    }
    table
}

pub fn history_table(series: &PriceSeries) -> Table {
    let mut table = new_table(["Date", "Close"]);
    for point in &series.points {
        table.add_row(vec![
            Cell::new(point.date.format("%Y-%m-%d")),
            right(format!("{:.2}", point.close)),
        ]);
    }
    table
}

pub fn recommendation_table(snapshot: &RecommendationSnapshot) -> Table {
    let mut table = new_table(["Recommendation", "Count"]);
    for (label, count) in snapshot.buckets() {
        table.add_row(vec![Cell::new(label), right(count)]);
    }
    table
}

pub fn sources_table(registry: &SourceRegistry) -> Table {
    let mut table = new_table(["Kind", "Identifier"]);
    for kind in SourceKind::ALL {
        for id in registry.list(kind) {
            table.add_row(vec![Cell::new(kind), Cell::new(id)]);
        }
    }
    table
}

pub fn feed_table(posts: &[FeedPost]) -> Table {
    let mut table = new_table(["#", "Time (UTC)", "Source", "Author", "Text", "URL"]);
    for (index, post) in posts.iter().enumerate() {
        table.add_row(vec![
            right(index),
            Cell::new(post.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&post.source_name),
            Cell::new(&post.author),
            Cell::new(preview(&post.text)),
            Cell::new(&post.url),
        ]);
    }
    table
}

pub fn models_table(models: &[GeminiModel]) -> Table {
    let mut table = new_table(["Model", "Display Name"]);
    for model in models {
        table.add_row(vec![
            Cell::new(&model.name),
            Cell::new(model.display_name.as_deref().unwrap_or_default()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lockstock::{PricePoint, Sentiment};

    #[test]
    fn test_preview() {
        assert_eq!(preview("Title line\nbody"), "Title line");
        let long = "a".repeat(200);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS);
        assert!(cut.ends_with('…'));
        assert_eq!(preview(""), "");
    }

    #[test]
    fn test_stocks_table_shows_placeholders() {
        let mut record = StockRecord::new("AMD", "Advanced Micro Devices");
        record.sentiment = Sentiment::Bullish;
        let rendered = stocks_table(&[record]).to_string();
        assert!(rendered.contains("Revenue (TTM)"));
        assert!(rendered.contains("AMD"));
        assert!(rendered.contains("Bullish"));
        assert!(rendered.contains("N/A"));
    }

    #[test]
    fn test_recommendation_table_order() {
        let snapshot = RecommendationSnapshot {
            symbol: "AAPL".to_string(),
            period: "2025-03-01".to_string(),
            strong_buy: 13,
            buy: 24,
            hold: 7,
            sell: 1,
            strong_sell: 0,
        };
        let rendered = recommendation_table(&snapshot).to_string();
        let strong_buy = rendered.find("Strong Buy").unwrap();
        let hold = rendered.find("Hold").unwrap();
        let strong_sell = rendered.find("Strong Sell").unwrap();
        assert!(strong_buy < hold && hold < strong_sell);
    }

    #[test]
    fn test_history_table() {
        let series = PriceSeries {
            symbol: "AAPL".to_string(),
            period: "5d".to_string(),
            points: vec![PricePoint {
                date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
                close: 241.456,
            }],
        };
        let rendered = history_table(&series).to_string();
        assert!(rendered.contains("2025-03-03"));
        assert!(rendered.contains("241.46"));
    }
}
