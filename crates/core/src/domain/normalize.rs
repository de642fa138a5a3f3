use crate::domain::annotate::{annotate, beginner_note};
use crate::domain::quote::{AnnotatedStock, CategorizedQuotes, RawQuote, SourceCategory};
use std::collections::HashSet;

/// Merges the categorized lists into a ranked, annotated view.
///
/// Lists are concatenated in the given order and deduplicated by symbol (first occurrence
/// wins). The survivors are stably sorted by `|change_percent|` descending, truncated to
/// `limit`, and ranked 1..=N. A non-positive `limit` yields an empty result.
pub fn normalize(lists: &[CategorizedQuotes], limit: i32) -> Vec<AnnotatedStock> {
    if limit <= 0 {
        return Vec::new();
    }

    let mut seen = HashSet::<&str>::new();
    let mut unique: Vec<(&RawQuote, SourceCategory)> = Vec::new();
    for list in lists {
        for quote in &list.quotes {
            if seen.insert(quote.symbol.as_str()) {
                unique.push((quote, list.category));
            }
        }
    }

    // `sort_by` is stable, so equal magnitudes keep first-seen order.
    unique.sort_by(|(a, _), (b, _)| b.change_percent.abs().total_cmp(&a.change_percent.abs()));
    unique.truncate(limit as usize);

    unique
        .into_iter()
        .enumerate()
        .map(|(idx, (quote, category))| into_annotated(idx as i32 + 1, quote, category))
        .collect()
}

fn into_annotated(rank: i32, quote: &RawQuote, category: SourceCategory) -> AnnotatedStock {
    let annotation = annotate(quote, category);
    AnnotatedStock {
        rank,
        symbol: quote.symbol.clone(),
        name: quote.name.clone(),
        price: quote.price,
        change: quote.change,
        change_percent: quote.change_percent,
        volume: quote.volume,
        market_cap: quote.market_cap.unwrap_or(0),
        confidence: annotation.confidence,
        selection_reason: annotation.selection_reason,
        highlight: annotation.highlight,
        beginner_note: beginner_note(&quote.name),
    }
}
