use crate::client::error::ApiError;
use crate::client::types::{StockDetail, TrendingResponse};
use crate::client::StockDataClient;
use crate::config::Settings;
use crate::domain::normalize::normalize;
use crate::domain::quote::AnnotatedStock;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA};
use serde::de::DeserializeOwned;
use std::time::Duration;

const TRENDING_PATH: &str = "/stocks/trending";
const STOCK_PATH: &str = "/stocks";

const TRENDING_FAILURE: &str = "failed to fetch trending stocks";
const DETAIL_FAILURE: &str = "failed to fetch stock detail";

/// Backend client. Market data is time sensitive, so every call is a fresh, uncached fetch
/// with no retry.
#[derive(Debug, Clone)]
pub struct HttpStockClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStockClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.api_base_url(), settings.api_timeout())
    }

    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        anyhow::ensure!(!base_url.is_empty(), "API base URL must be non-empty");

        let mut builder = reqwest::Client::builder().default_headers(no_cache_headers());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build stock API http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, failure: &str) -> Result<T, ApiError> {
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ApiError::transport(failure, err))?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%url, http_status = %status, "stock API returned an error status");
            // A broken error body still reports the status.
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::http(status.as_u16(), &text));
        }

        let text = res
            .text()
            .await
            .map_err(|err| ApiError::transport(failure, err))?;

        serde_json::from_str::<T>(&text).map_err(|err| ApiError::decode(failure, err))
    }
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

#[async_trait::async_trait]
impl StockDataClient for HttpStockClient {
    fn source_name(&self) -> &'static str {
        "goodmorning_backend"
    }

    async fn fetch_trending(&self, limit: i32) -> Result<Vec<AnnotatedStock>, ApiError> {
        let url = self.url(TRENDING_PATH);
        let body: TrendingResponse = self.get_json(url, TRENDING_FAILURE).await?;

        if let Some(message) = body.error.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            tracing::warn!(error = %message, "stock API reported an application error");
            return Err(ApiError::application(
                message,
                serde_json::to_value(&body).ok(),
            ));
        }

        let source = body.source.clone();
        let lists = body
            .into_categorized()
            .map_err(|err| ApiError::decode(TRENDING_FAILURE, format!("{err:#}")))?;

        let stocks = normalize(&lists, limit);
        tracing::info!(
            source = source.as_deref().unwrap_or("unknown"),
            limit,
            stocks = stocks.len(),
            "fetched trending stocks"
        );
        Ok(stocks)
    }

    async fn fetch_stock_detail(&self, symbol: &str) -> Result<StockDetail, ApiError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
            return Err(ApiError::invalid_input(format!("invalid symbol: {symbol:?}")));
        }

        let url = self.url(&format!("{STOCK_PATH}/{symbol}"));
        self.get_json(url, DETAIL_FAILURE).await
    }
}
