use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

// Eastern Standard Time. Against EDT this runs an hour late, which only moves the cutoff
// further past the close.
const US_EASTERN_OFFSET_SECS: i32 = -5 * 3600;
const KST_OFFSET_SECS: i32 = 9 * 3600;

// NYSE closes at 16:00 ET; the session counts as complete from 16:30.
const CLOSE_CUTOFF_HOUR_ET: u32 = 16;
const CLOSE_CUTOFF_MINUTE_ET: u32 = 30;

/// The US trading session a briefing generated at `now_utc` should cover.
pub fn resolve_market_date(
    market_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = market_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid market date {s:?} (expected YYYY-MM-DD)"));
    }

    let et = FixedOffset::east_opt(US_EASTERN_OFFSET_SECS).context("invalid ET offset")?;
    let now_et = now_utc.with_timezone(&et);

    let cutoff_reached =
        (now_et.hour(), now_et.minute()) >= (CLOSE_CUTOFF_HOUR_ET, CLOSE_CUTOFF_MINUTE_ET);
    let mut date = now_et.date_naive();
    if !cutoff_reached {
        date = date - Duration::days(1);
    }

    let holidays = configured_holidays();
    while is_weekend(date) || holidays.contains(&date) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

/// Local date of the reader, used for briefing titles and ids.
pub fn publish_date_kst(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS).context("invalid KST offset")?;
    Ok(now_utc.with_timezone(&kst).date_naive())
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date NYSE holidays only.
    // Extend via US_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    for y in 2024..=2030 {
        for (m, d) in [(1, 1), (6, 19), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("US_MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                Ok(d) => {
                    out.insert(d);
                }
                Err(err) => tracing::warn!(value = part, error = %err, "ignoring invalid US_MARKET_HOLIDAYS entry"),
            }
        }
    }

    out
}
