use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated quote as delivered by one of the backend's screener lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: Option<u64>,
}

/// The screener list a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    Trending,
    MostActives,
    DayGainers,
    DayLosers,
}

impl SourceCategory {
    /// Concatenation order used when the lists are merged.
    pub const ALL: [SourceCategory; 4] = [
        SourceCategory::Trending,
        SourceCategory::MostActives,
        SourceCategory::DayGainers,
        SourceCategory::DayLosers,
    ];

    pub fn default_reason(self) -> &'static str {
        match self {
            SourceCategory::Trending | SourceCategory::MostActives => "거래량 상위",
            SourceCategory::DayGainers => "상승률 상위",
            SourceCategory::DayLosers => "하락률 상위",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedQuotes {
    pub category: SourceCategory,
    pub quotes: Vec<RawQuote>,
}

impl CategorizedQuotes {
    pub fn new(category: SourceCategory, quotes: Vec<RawQuote>) -> Self {
        Self { category, quotes }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedStock {
    pub rank: i32,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub confidence: Confidence,
    pub selection_reason: String,
    pub highlight: String,
    pub beginner_note: String,
}
