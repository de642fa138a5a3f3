use crate::domain::quote::{CategorizedQuotes, RawQuote, SourceCategory};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "N/A";
pub const DEFAULT_NUMERIC: f64 = 0.0;
pub const DEFAULT_VOLUME: u64 = 0;

/// `GET /stocks/trending` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingResponse {
    #[serde(default)]
    pub trending: Vec<WireQuote>,
    #[serde(default)]
    pub most_actives: Vec<WireQuote>,
    #[serde(default)]
    pub day_gainers: Vec<WireQuote>,
    #[serde(default)]
    pub day_losers: Vec<WireQuote>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A quote as it appears on the wire; every optional field has a named default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireQuote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default)]
    pub market_cap: Option<u64>,
}

impl WireQuote {
    pub fn validate_and_into_quote(self) -> anyhow::Result<RawQuote> {
        let symbol = self.symbol.trim().to_string();
        ensure!(!symbol.is_empty(), "symbol must be non-empty");

        let name = self
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        let price = finite(self.price, "price", &symbol)?;
        let change = finite(self.change, "change", &symbol)?;
        let change_percent = finite(self.change_percent, "change_percent", &symbol)?;

        Ok(RawQuote {
            symbol,
            name,
            price,
            change,
            change_percent,
            volume: self.volume.unwrap_or(DEFAULT_VOLUME),
            market_cap: self.market_cap,
        })
    }
}

fn finite(v: Option<f64>, field: &str, symbol: &str) -> anyhow::Result<f64> {
    let v = v.unwrap_or(DEFAULT_NUMERIC);
    ensure!(v.is_finite(), "{field} must be finite for {symbol} (got {v})");
    Ok(v)
}

impl TrendingResponse {
    /// Validates every quote and returns the lists in concatenation order.
    pub fn into_categorized(self) -> anyhow::Result<Vec<CategorizedQuotes>> {
        let lists = [
            (SourceCategory::Trending, self.trending),
            (SourceCategory::MostActives, self.most_actives),
            (SourceCategory::DayGainers, self.day_gainers),
            (SourceCategory::DayLosers, self.day_losers),
        ];

        let mut out = Vec::with_capacity(lists.len());
        for (category, quotes) in lists {
            let quotes = quotes
                .into_iter()
                .enumerate()
                .map(|(idx, q)| {
                    q.validate_and_into_quote()
                        .with_context(|| format!("invalid quote at {category:?}[{idx}]"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            out.push(CategorizedQuotes::new(category, quotes));
        }
        Ok(out)
    }
}

/// `GET /stocks/{symbol}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetail {
    pub symbol: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub market_cap: Option<u64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}
