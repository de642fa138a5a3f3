use crate::domain::format::{grouped_decimal, signed_percent};
use crate::domain::quote::AnnotatedStock;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const BRIEFING_STOCK_COUNT: usize = 5;
const DISCLAIMER: &str = "⚠️ 본 정보는 투자 권유가 아닙니다.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub value: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub nasdaq: IndexQuote,
    pub sp500: IndexQuote,
    pub dow: IndexQuote,
}

/// A packaged daily summary of trending stocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Briefing {
    pub id: String,
    pub market_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub subtitle: String,
    pub stocks: Vec<AnnotatedStock>,
    pub market_overview: Option<MarketOverview>,
}

impl Briefing {
    /// Keeps the top ranked stocks. `publish_date` is the local date printed in the title.
    pub fn from_stocks(
        market_date: NaiveDate,
        publish_date: NaiveDate,
        created_at: DateTime<Utc>,
        stocks: &[AnnotatedStock],
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!stocks.is_empty(), "briefing needs at least one stock");

        let mut stocks: Vec<AnnotatedStock> = stocks.to_vec();
        stocks.sort_by_key(|s| s.rank);
        stocks.truncate(BRIEFING_STOCK_COUNT);

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Ok(Self {
            id: format!("br_{}_{}", publish_date.format("%Y%m%d"), &suffix[..6]),
            market_date,
            created_at,
            title: format!(
                "🌅 굿모닝 월가 - {}년 {}월 {}일",
                publish_date.year(),
                publish_date.month(),
                publish_date.day()
            ),
            subtitle: "어젯밤 미국 증시에서 가장 뜨거웠던 종목들".to_string(),
            stocks,
            market_overview: None,
        })
    }

    pub fn with_market_overview(mut self, overview: MarketOverview) -> Self {
        self.market_overview = Some(overview);
        self
    }

    pub fn top_stock(&self) -> Option<&AnnotatedStock> {
        self.stocks.first()
    }

    /// Plain-text version suitable for email bodies and Slack messages.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push_str("\n\n");
        out.push_str(&format!("📊 오늘의 화제 종목 TOP {}\n", self.stocks.len()));

        for stock in &self.stocks {
            out.push('\n');
            out.push_str(&format!(
                "{} {} ({}) ${} ({})\n",
                rank_marker(stock.rank),
                stock.symbol,
                stock.name,
                grouped_decimal(stock.price, 2),
                signed_percent(stock.change_percent, 2),
            ));
            out.push_str(&format!("   → {}\n", stock.highlight));
        }

        if let Some(overview) = &self.market_overview {
            out.push_str("\n📈 시장 개요\n");
            for (label, quote) in [
                ("나스닥", overview.nasdaq),
                ("S&P 500", overview.sp500),
                ("다우", overview.dow),
            ] {
                out.push_str(&format!(
                    "• {label}: {} ({})\n",
                    grouped_decimal(quote.value, 1),
                    signed_percent(quote.change_percent, 1),
                ));
            }
        }

        out.push('\n');
        out.push_str(DISCLAIMER);
        out
    }
}

fn rank_marker(rank: i32) -> String {
    const KEYCAPS: [&str; 10] = ["0️⃣", "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"];
    match usize::try_from(rank) {
        Ok(r @ 1..=9) => KEYCAPS[r].to_string(),
        _ => format!("{rank}."),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Email,
    Slack,
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryChannel::Email => f.write_str("email"),
            DeliveryChannel::Slack => f.write_str("slack"),
        }
    }
}

impl FromStr for DeliveryChannel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(DeliveryChannel::Email),
            "slack" => Ok(DeliveryChannel::Slack),
            other => anyhow::bail!("unknown delivery channel: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub id: String,
    pub briefing_id: String,
    pub channel: DeliveryChannel,
    pub sent_at: DateTime<Utc>,
    pub recipients_count: u32,
}

/// Simulates sending a briefing. Nothing leaves the process; the delay stands in for the
/// round trip a real delivery would take.
pub async fn deliver_mock(
    briefing: &Briefing,
    channel: DeliveryChannel,
    recipients_count: u32,
    delay: Duration,
) -> DeliveryReceipt {
    tracing::info!(
        briefing_id = %briefing.id,
        %channel,
        recipients_count,
        "mock delivery started"
    );
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let receipt = DeliveryReceipt {
        id: format!("del_{channel}_{}", &suffix[..6]),
        briefing_id: briefing.id.clone(),
        channel,
        sent_at: Utc::now(),
        recipients_count,
    };
    tracing::info!(delivery_id = %receipt.id, %channel, "mock delivery completed");
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::Confidence;
    use chrono::TimeZone;

    fn stock(rank: i32, symbol: &str, name: &str, price: f64, pct: f64, highlight: &str) -> AnnotatedStock {
        AnnotatedStock {
            rank,
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change: 0.0,
            change_percent: pct,
            volume: 0,
            market_cap: 0,
            confidence: Confidence::Low,
            selection_reason: "거래량 상위".to_string(),
            highlight: highlight.to_string(),
            beginner_note: String::new(),
        }
    }

    fn dates() -> (NaiveDate, NaiveDate, DateTime<Utc>) {
        (
            NaiveDate::from_ymd_opt(2025, 12, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 10).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 10, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn renders_text_version() {
        let (market, publish, created) = dates();
        let stocks = vec![
            stock(2, "AAPL", "Apple", 195.2, -1.17, "📱 아이폰 판매 우려로 소폭 하락"),
            stock(1, "NVDA", "NVIDIA", 142.5, 6.15, "🔥 AI 칩 신제품 발표로 급등"),
        ];
        let briefing = Briefing::from_stocks(market, publish, created, &stocks)
            .unwrap()
            .with_market_overview(MarketOverview {
                nasdaq: IndexQuote { value: 16250.5, change_percent: 1.2 },
                sp500: IndexQuote { value: 4850.2, change_percent: 0.8 },
                dow: IndexQuote { value: 38500.0, change_percent: -0.5 },
            });

        assert!(briefing.id.starts_with("br_20251210_"));
        assert_eq!(briefing.id.len(), "br_20251210_".len() + 6);
        assert_eq!(briefing.top_stock().map(|s| s.symbol.as_str()), Some("NVDA"));

        let expected = "🌅 굿모닝 월가 - 2025년 12월 10일\n\n\
📊 오늘의 화제 종목 TOP 2\n\n\
1️⃣ NVDA (NVIDIA) $142.50 (+6.15%)\n   → 🔥 AI 칩 신제품 발표로 급등\n\n\
2️⃣ AAPL (Apple) $195.20 (-1.17%)\n   → 📱 아이폰 판매 우려로 소폭 하락\n\n\
📈 시장 개요\n\
• 나스닥: 16,250.5 (+1.2%)\n\
• S&P 500: 4,850.2 (+0.8%)\n\
• 다우: 38,500.0 (-0.5%)\n\n\
⚠️ 본 정보는 투자 권유가 아닙니다.";
        assert_eq!(briefing.render_text(), expected);
    }

    #[test]
    fn keeps_only_top_five() {
        let (market, publish, created) = dates();
        let stocks: Vec<_> = (1..=7)
            .map(|r| stock(r, &format!("S{r}"), "X", 1.0, 1.0, "h"))
            .collect();
        let briefing = Briefing::from_stocks(market, publish, created, &stocks).unwrap();
        assert_eq!(briefing.stocks.len(), BRIEFING_STOCK_COUNT);
        assert_eq!(briefing.stocks[4].symbol, "S5");
    }

    #[test]
    fn rejects_empty_stock_list() {
        let (market, publish, created) = dates();
        assert!(Briefing::from_stocks(market, publish, created, &[]).is_err());
    }

    #[test]
    fn rank_markers_fall_back_to_numbers() {
        assert_eq!(rank_marker(1), "1️⃣");
        assert_eq!(rank_marker(10), "10.");
    }

    #[test]
    fn parses_delivery_channels() {
        assert_eq!("Email".parse::<DeliveryChannel>().unwrap(), DeliveryChannel::Email);
        assert_eq!("slack".parse::<DeliveryChannel>().unwrap(), DeliveryChannel::Slack);
        assert!("sms".parse::<DeliveryChannel>().is_err());
    }

    #[tokio::test]
    async fn mock_delivery_returns_receipt() {
        let (market, publish, created) = dates();
        let stocks = vec![stock(1, "NVDA", "NVIDIA", 142.5, 6.15, "h")];
        let briefing = Briefing::from_stocks(market, publish, created, &stocks).unwrap();

        let receipt = deliver_mock(&briefing, DeliveryChannel::Slack, 3, Duration::ZERO).await;
        assert!(receipt.id.starts_with("del_slack_"));
        assert_eq!(receipt.briefing_id, briefing.id);
        assert_eq!(receipt.recipients_count, 3);
    }
}
