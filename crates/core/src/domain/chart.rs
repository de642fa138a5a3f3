use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartPeriod {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl ChartPeriod {
    fn label(self) -> &'static str {
        match self {
            ChartPeriod::FiveDays => "5일",
            ChartPeriod::OneMonth => "한 달",
            ChartPeriod::ThreeMonths => "3개월",
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartPeriod::FiveDays => "5d",
            ChartPeriod::OneMonth => "1mo",
            ChartPeriod::ThreeMonths => "3mo",
        };
        f.write_str(s)
    }
}

impl FromStr for ChartPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5d" => Ok(ChartPeriod::FiveDays),
            "1mo" => Ok(ChartPeriod::OneMonth),
            "3mo" => Ok(ChartPeriod::ThreeMonths),
            other => anyhow::bail!("unknown chart period: {other} (expected 5d, 1mo or 3mo)"),
        }
    }
}

/// Rule-based one-line commentary on a price series.
pub fn chart_insight(points: &[ChartPoint], period: ChartPeriod) -> String {
    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    closes_insight(&closes, period)
}

pub fn closes_insight(closes: &[f64], period: ChartPeriod) -> String {
    let (Some(&start), Some(&end)) = (closes.first(), closes.last()) else {
        return "데이터가 충분하지 않아요.".to_string();
    };
    if closes.len() < 2 || !start.is_finite() || !end.is_finite() || start == 0.0 {
        return "데이터가 충분하지 않아요.".to_string();
    }

    let change = (end - start) / start * 100.0;
    let label = period.label();

    // Non-decreasing over the last three closes.
    let tail = &closes[closes.len().saturating_sub(3)..];
    let recovering = tail.windows(2).all(|w| w[0] <= w[1]);

    if change >= 15.0 {
        let emoji = if period == ChartPeriod::FiveDays { "🔥" } else { "🚀" };
        return format!("{label}간 +{change:.1}% 급등! 매우 강한 상승세예요 {emoji}");
    }
    if change >= 5.0 {
        return format!("{label}간 +{change:.1}% 상승했어요. 긍정적인 흐름이에요 📈");
    }
    if change >= 1.0 {
        return format!("{label}간 +{change:.1}% 소폭 상승. 안정적인 모습이에요 📊");
    }
    if change >= -1.0 {
        return format!("{label}간 큰 변동 없이 횡보 중이에요. 방향을 지켜보세요 ➡️");
    }
    if change >= -5.0 {
        if recovering {
            return format!("{label}간 {change:.1}% 하락했지만, 최근 반등 중이에요 🔄");
        }
        return format!("{label}간 {change:.1}% 하락했어요. 조정 구간일 수 있어요 📉");
    }
    if recovering {
        return format!("{label}간 {change:.1}% 하락 후 반등 시도 중이에요 💪");
    }
    format!("{label}간 {change:.1}% 급락! 신중한 접근이 필요해요 ⚠️")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_points() {
        assert_eq!(closes_insight(&[], ChartPeriod::FiveDays), "데이터가 충분하지 않아요.");
        assert_eq!(closes_insight(&[100.0], ChartPeriod::OneMonth), "데이터가 충분하지 않아요.");
    }

    #[test]
    fn non_finite_endpoints_are_insufficient() {
        assert_eq!(closes_insight(&[100.0, f64::NAN], ChartPeriod::FiveDays), "데이터가 충분하지 않아요.");
        assert_eq!(
            closes_insight(&[f64::INFINITY, 95.0, 100.0], ChartPeriod::OneMonth),
            "데이터가 충분하지 않아요."
        );
    }

    #[test]
    fn strong_rally_uses_period_emoji() {
        assert_eq!(
            closes_insight(&[100.0, 110.0, 120.0], ChartPeriod::FiveDays),
            "5일간 +20.0% 급등! 매우 강한 상승세예요 🔥"
        );
        assert_eq!(
            closes_insight(&[100.0, 120.0], ChartPeriod::ThreeMonths),
            "3개월간 +20.0% 급등! 매우 강한 상승세예요 🚀"
        );
    }

    #[test]
    fn moderate_moves() {
        assert_eq!(
            closes_insight(&[100.0, 106.0], ChartPeriod::OneMonth),
            "한 달간 +6.0% 상승했어요. 긍정적인 흐름이에요 📈"
        );
        assert_eq!(
            closes_insight(&[100.0, 102.0], ChartPeriod::OneMonth),
            "한 달간 +2.0% 소폭 상승. 안정적인 모습이에요 📊"
        );
        assert_eq!(
            closes_insight(&[100.0, 100.5], ChartPeriod::OneMonth),
            "한 달간 큰 변동 없이 횡보 중이에요. 방향을 지켜보세요 ➡️"
        );
    }

    #[test]
    fn declines_check_recent_recovery() {
        assert_eq!(
            closes_insight(&[100.0, 95.0, 96.0, 97.0], ChartPeriod::FiveDays),
            "5일간 -3.0% 하락했지만, 최근 반등 중이에요 🔄"
        );
        assert_eq!(
            closes_insight(&[100.0, 99.0, 98.0, 97.0, 96.5, 97.0, 96.0], ChartPeriod::FiveDays),
            "5일간 -4.0% 하락했어요. 조정 구간일 수 있어요 📉"
        );
        assert_eq!(
            closes_insight(&[100.0, 80.0, 85.0, 90.0], ChartPeriod::ThreeMonths),
            "3개월간 -10.0% 하락 후 반등 시도 중이에요 💪"
        );
        assert_eq!(
            closes_insight(&[100.0, 95.0, 90.0], ChartPeriod::ThreeMonths),
            "3개월간 -10.0% 급락! 신중한 접근이 필요해요 ⚠️"
        );
    }

    #[test]
    fn chart_points_use_closes() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2025, 12, d).unwrap();
        let points = vec![
            ChartPoint { date: day(1), close: 100.0, volume: 10_000_000 },
            ChartPoint { date: day(2), close: 106.0, volume: 12_000_000 },
        ];
        assert_eq!(
            chart_insight(&points, ChartPeriod::OneMonth),
            "한 달간 +6.0% 상승했어요. 긍정적인 흐름이에요 📈"
        );
    }

    #[test]
    fn parses_period_labels() {
        assert_eq!("5d".parse::<ChartPeriod>().unwrap(), ChartPeriod::FiveDays);
        assert_eq!("1MO".parse::<ChartPeriod>().unwrap(), ChartPeriod::OneMonth);
        assert!("1y".parse::<ChartPeriod>().is_err());
        assert_eq!(ChartPeriod::ThreeMonths.to_string(), "3mo");
    }
}
