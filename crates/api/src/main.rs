use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goodmorning_core::client::error::{ApiError, ApiErrorKind};
use goodmorning_core::client::types::StockDetail;
use goodmorning_core::client::{HttpStockClient, StockDataClient};
use goodmorning_core::dashboard::{Dashboard, DashboardView, LoadState};
use goodmorning_core::domain::briefing::{deliver_mock, Briefing, DeliveryChannel, DeliveryReceipt};
use goodmorning_core::domain::quote::AnnotatedStock;
use goodmorning_core::theme::{Theme, ThemeStore};
use goodmorning_core::time::us_market;

const DEFAULT_EMAIL_RECIPIENTS: u32 = 150;
const DEFAULT_SLACK_RECIPIENTS: u32 = 3;

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

    let client = HttpStockClient::from_settings(&settings)?;
    tracing::info!(base_url = %client.base_url(), "stock API client ready");

    let state = AppState {
        client: Arc::new(client.clone()),
        dashboard: Arc::new(Dashboard::new(Arc::new(client), settings.trending_limit)),
        theme: Arc::new(ThemeStore::new(settings.theme)),
        delivery_delay: settings.delivery_delay(),
    };

    spawn_theme_logger(&state.theme);

    // Initial load; failures surface as the dashboard's error state.
    let dashboard = state.dashboard.clone();
    tokio::spawn(async move {
        let view = dashboard.refresh().await;
        if let LoadState::Error(err) = &view.state {
            tracing::warn!(error = %err, "initial dashboard load failed");
        }
    });

    let app = app(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/theme", get(get_theme).put(put_theme))
        .route("/theme/toggle", post(toggle_theme))
        .route("/briefing", get(get_briefing_text))
        .route("/briefing/deliveries/:channel", post(deliver_briefing))
        .route("/stocks/:symbol", get(get_stock_detail))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    client: Arc<dyn StockDataClient>,
    dashboard: Arc<Dashboard>,
    theme: Arc<ThemeStore>,
    delivery_delay: Duration,
}

fn spawn_theme_logger(theme: &ThemeStore) {
    let mut rx = theme.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let theme = *rx.borrow_and_update();
            tracing::info!(%theme, "theme updated");
        }
    });
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    message: String,
    status_code: Option<u16>,
}

impl From<&ApiError> for ApiErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.message.clone(),
            status_code: err.status_code,
        }
    }
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    status: &'static str,
    stocks: Vec<AnnotatedStock>,
    error: Option<ApiErrorBody>,
    theme: Theme,
    request_seq: u64,
    updated_at: DateTime<Utc>,
}

impl DashboardResponse {
    fn new(view: DashboardView, theme: Theme) -> Self {
        let status = view.state.label();
        let (stocks, error) = match view.state {
            LoadState::Loading => (Vec::new(), None),
            LoadState::Success(stocks) => (stocks, None),
            LoadState::Error(err) => (Vec::new(), Some(ApiErrorBody::from(&err))),
        };
        Self {
            status,
            stocks,
            error,
            theme,
            request_seq: view.request_seq,
            updated_at: view.updated_at,
        }
    }
}

async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let view = state.dashboard.view().await;
    Json(DashboardResponse::new(view, state.theme.current()))
}

async fn refresh_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let view = state.dashboard.refresh().await;
    Json(DashboardResponse::new(view, state.theme.current()))
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeBody {
    theme: Theme,
}

async fn get_theme(State(state): State<AppState>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: state.theme.current(),
    })
}

async fn put_theme(State(state): State<AppState>, Json(body): Json<ThemeBody>) -> Json<ThemeBody> {
    state.theme.set(body.theme);
    Json(ThemeBody { theme: body.theme })
}

async fn toggle_theme(State(state): State<AppState>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: state.theme.toggle(),
    })
}

async fn current_briefing(state: &AppState) -> Result<Briefing, StatusCode> {
    let Some(stocks) = state.dashboard.stocks().await else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    if stocks.is_empty() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let now = Utc::now();
    let market_date = us_market::resolve_market_date(None, now).map_err(internal_error)?;
    let publish_date = us_market::publish_date_kst(now).map_err(internal_error)?;
    Briefing::from_stocks(market_date, publish_date, now, &stocks).map_err(internal_error)
}

async fn get_briefing_text(State(state): State<AppState>) -> Result<String, StatusCode> {
    let briefing = current_briefing(&state).await?;
    Ok(briefing.render_text())
}

async fn deliver_briefing(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<DeliveryReceipt>, StatusCode> {
    let channel: DeliveryChannel = channel.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let briefing = current_briefing(&state).await?;

    let recipients = match channel {
        DeliveryChannel::Email => DEFAULT_EMAIL_RECIPIENTS,
        DeliveryChannel::Slack => DEFAULT_SLACK_RECIPIENTS,
    };
    let receipt = deliver_mock(&briefing, channel, recipients, state.delivery_delay).await;
    Ok(Json(receipt))
}

async fn get_stock_detail(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockDetail>, ApiErrorResponse> {
    let detail = state
        .client
        .fetch_stock_detail(&symbol)
        .await
        .map_err(ApiErrorResponse)?;
    Ok(Json(detail))
}

struct ApiErrorResponse(ApiError);

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ApiErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            _ => self
                .0
                .status_code
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        };
        let body = serde_json::json!({ "detail": self.0.message });
        (status, Json(body)).into_response()
    }
}

fn internal_error(err: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use goodmorning_core::domain::quote::Confidence;
    use serde_json::Value;

    struct FixedClient {
        reply: Result<Vec<AnnotatedStock>, ApiError>,
    }

    #[async_trait::async_trait]
    impl StockDataClient for FixedClient {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_trending(&self, _limit: i32) -> Result<Vec<AnnotatedStock>, ApiError> {
            self.reply.clone()
        }

        async fn fetch_stock_detail(&self, symbol: &str) -> Result<StockDetail, ApiError> {
            Err(ApiError::http(
                404,
                &serde_json::json!({ "detail": format!("종목 {symbol}을(를) 찾을 수 없습니다.") })
                    .to_string(),
            ))
        }
    }

    fn nvda() -> AnnotatedStock {
        AnnotatedStock {
            rank: 1,
            symbol: "NVDA".to_string(),
            name: "NVIDIA Corporation".to_string(),
            price: 142.5,
            change: 8.25,
            change_percent: 6.15,
            volume: 58_420_000,
            market_cap: 3_500_000_000_000,
            confidence: Confidence::Medium,
            selection_reason: "급등주".to_string(),
            highlight: "🔥 6.2% 상승으로 주목".to_string(),
            beginner_note: String::new(),
        }
    }

    async fn serve(reply: Result<Vec<AnnotatedStock>, ApiError>) -> String {
        serve_client(Arc::new(FixedClient { reply })).await
    }

    async fn serve_client(client: Arc<dyn StockDataClient>) -> String {
        let state = AppState {
            client: client.clone(),
            dashboard: Arc::new(Dashboard::new(client, 5)),
            theme: Arc::new(ThemeStore::default()),
            delivery_delay: Duration::ZERO,
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn dashboard_moves_from_loading_to_success() {
        let base = serve(Ok(vec![nvda()])).await;
        let http = reqwest::Client::new();

        let v: Value = http.get(format!("{base}/dashboard")).send().await.unwrap().json().await.unwrap();
        assert_eq!(v["status"], "loading");
        assert_eq!(v["theme"], "dark");

        let v: Value = http
            .post(format!("{base}/dashboard/refresh"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["stocks"][0]["symbol"], "NVDA");
        assert_eq!(v["stocks"][0]["confidence"], "MEDIUM");

        let text = http.get(format!("{base}/briefing")).send().await.unwrap().text().await.unwrap();
        assert!(text.contains("1️⃣ NVDA (NVIDIA Corporation) $142.50 (+6.15%)"));

        let receipt: Value = http
            .post(format!("{base}/briefing/deliveries/email"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(receipt["channel"], "email");
        assert_eq!(receipt["recipients_count"], 150);
    }

    #[tokio::test]
    async fn failed_refresh_reports_error_and_blocks_briefing() {
        let base = serve(Err(ApiError::http(500, "boom"))).await;
        let http = reqwest::Client::new();

        let v: Value = http
            .post(format!("{base}/dashboard/refresh"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"]["status_code"], 500);
        assert_eq!(v["error"]["message"], "HTTP error! status: 500");

        let res = http.get(format!("{base}/briefing")).send().await.unwrap();
        assert_eq!(res.status().as_u16(), 503);

        let res = http
            .post(format!("{base}/briefing/deliveries/fax"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn theme_toggle_and_set() {
        let base = serve(Ok(Vec::new())).await;
        let http = reqwest::Client::new();

        let v: Value = http.post(format!("{base}/theme/toggle")).send().await.unwrap().json().await.unwrap();
        assert_eq!(v["theme"], "light");

        let v: Value = http
            .put(format!("{base}/theme"))
            .json(&serde_json::json!({"theme": "dark"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v["theme"], "dark");
    }

    #[tokio::test]
    async fn stock_detail_passes_through_upstream_status() {
        let base = serve(Ok(Vec::new())).await;
        let res = reqwest::get(format!("{base}/stocks/ZZZZ")).await.unwrap();
        assert_eq!(res.status().as_u16(), 404);
        let v: Value = res.json().await.unwrap();
        assert_eq!(v["detail"], "종목 ZZZZ을(를) 찾을 수 없습니다.");
    }

    #[tokio::test]
    async fn malformed_symbol_is_a_bad_request() {
        // Nothing listens on the discard port; the symbol is rejected before any request.
        let client = HttpStockClient::new("http://127.0.0.1:9", Some(Duration::from_secs(1))).unwrap();
        let base = serve_client(Arc::new(client)).await;

        let res = reqwest::get(format!("{base}/stocks/BRK$A")).await.unwrap();
        assert_eq!(res.status().as_u16(), 400);
        let v: Value = res.json().await.unwrap();
        assert_eq!(v["detail"], "invalid symbol: \"BRK$A\"");
    }
}
