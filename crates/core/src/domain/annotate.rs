use crate::domain::quote::{Confidence, RawQuote, SourceCategory};

const HIGH_CONFIDENCE_ABOVE: f64 = 10.0;
const MEDIUM_CONFIDENCE_ABOVE: f64 = 5.0;
const SURGE_ABOVE: f64 = 5.0;
const PLUNGE_BELOW: f64 = -5.0;

pub const SURGE_REASON: &str = "급등주";
pub const PLUNGE_REASON: &str = "급락주";

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub confidence: Confidence,
    pub selection_reason: String,
    pub highlight: String,
}

/// Derives the heuristic labels for a quote. Pure in `change_percent` and `category`.
pub fn annotate(quote: &RawQuote, category: SourceCategory) -> Annotation {
    let pct = quote.change_percent;
    debug_assert!(pct.is_finite(), "change_percent must be finite (got {pct})");

    Annotation {
        confidence: confidence_for(pct),
        selection_reason: selection_reason(pct, category).to_string(),
        highlight: highlight(pct),
    }
}

// Boundaries are exclusive: 10.0 is MEDIUM, 5.0 is LOW.
pub fn confidence_for(change_percent: f64) -> Confidence {
    let magnitude = change_percent.abs();
    if magnitude > HIGH_CONFIDENCE_ABOVE {
        Confidence::High
    } else if magnitude > MEDIUM_CONFIDENCE_ABOVE {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn selection_reason(change_percent: f64, category: SourceCategory) -> &'static str {
    if change_percent > SURGE_ABOVE {
        SURGE_REASON
    } else if change_percent < PLUNGE_BELOW {
        PLUNGE_REASON
    } else {
        category.default_reason()
    }
}

pub fn highlight(change_percent: f64) -> String {
    let magnitude = change_percent.abs();
    if change_percent > 0.0 {
        format!("🔥 {magnitude:.1}% 상승으로 주목")
    } else if change_percent < 0.0 {
        format!("⚠️ {magnitude:.1}% 하락으로 주목")
    } else {
        "📊 높은 거래량으로 주목".to_string()
    }
}

pub fn beginner_note(name: &str) -> String {
    format!("{name}은(는) 현재 시장에서 높은 관심을 받고 있는 종목입니다.")
}
