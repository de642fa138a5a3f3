use anyhow::Context;
use clap::{Parser, Subcommand};
use goodmorning_core::client::{HttpStockClient, StockDataClient};
use goodmorning_core::domain::briefing::{deliver_mock, Briefing, DeliveryChannel};
use goodmorning_core::domain::chart::{closes_insight, ChartPeriod};
use goodmorning_core::domain::format::compact_number;
use goodmorning_core::time::us_market;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "goodmorning_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch trending stocks once and print the daily briefing.
    Briefing {
        /// Market date (YYYY-MM-DD). Defaults to the last completed US session.
        #[arg(long)]
        market_date: Option<String>,

        /// Number of stocks to rank. Defaults to TRENDING_LIMIT.
        #[arg(long)]
        limit: Option<i32>,

        /// Print the briefing as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Mock-deliver the briefing (email or slack). May be repeated.
        #[arg(long = "deliver")]
        deliver: Vec<String>,
    },

    /// Print the rule-based commentary for a series of closing prices.
    Insight {
        /// 5d, 1mo or 3mo.
        #[arg(long, default_value = "5d")]
        period: String,

        /// Comma-separated closes, oldest first.
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        closes: Vec<f64>,
    },

    /// Print the detail record for one symbol.
    Stock { symbol: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = goodmorning_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = run(args.command, &settings).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    res
}

async fn run(command: Command, settings: &goodmorning_core::config::Settings) -> anyhow::Result<()> {
    match command {
        Command::Briefing {
            market_date,
            limit,
            json,
            deliver,
        } => {
            let channels = deliver
                .iter()
                .map(|c| c.parse::<DeliveryChannel>())
                .collect::<anyhow::Result<Vec<_>>>()?;

            let now = chrono::Utc::now();
            let market_date = us_market::resolve_market_date(market_date.as_deref(), now)?;
            let publish_date = us_market::publish_date_kst(now)?;
            let limit = limit.unwrap_or(settings.trending_limit);

            let client = HttpStockClient::from_settings(settings)?;
            let stocks = client
                .fetch_trending(limit)
                .await
                .context("trending fetch failed")?;

            let briefing = Briefing::from_stocks(market_date, publish_date, now, &stocks)?;
            tracing::info!(
                briefing_id = %briefing.id,
                %market_date,
                stocks = briefing.stocks.len(),
                "briefing generated"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&briefing)?);
            } else {
                println!("{}", briefing.render_text());
            }

            // The worker delivers to the operator only.
            for channel in channels {
                let receipt = deliver_mock(&briefing, channel, 1, settings.delivery_delay()).await;
                tracing::info!(delivery_id = %receipt.id, %channel, "briefing delivered (mock)");
            }
        }
        Command::Insight { period, closes } => {
            let period: ChartPeriod = period.parse()?;
            println!("{}", closes_insight(&closes, period));
        }
        Command::Stock { symbol } => {
            let client = HttpStockClient::from_settings(settings)?;
            let detail = client
                .fetch_stock_detail(&symbol)
                .await
                .with_context(|| format!("stock detail fetch failed for {symbol}"))?;

            println!("{} ({}) ${:.2}", detail.symbol, detail.name, detail.price);
            println!("  volume: {}", compact_number(detail.volume));
            if let Some(cap) = detail.market_cap {
                println!("  market cap: {}", compact_number(cap));
            }
            if let Some(pe) = detail.pe_ratio {
                println!("  P/E: {pe:.1}");
            }
        }
    }
    Ok(())
}

fn init_sentry(settings: &goodmorning_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
