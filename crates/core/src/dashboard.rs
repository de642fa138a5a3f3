use crate::client::error::ApiError;
use crate::client::StockDataClient;
use crate::domain::quote::AnnotatedStock;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Success(Vec<AnnotatedStock>),
    Error(ApiError),
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Success(_) => "success",
            LoadState::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub state: LoadState,
    /// Sequence number of the request that produced `state`.
    pub request_seq: u64,
    pub updated_at: DateTime<Utc>,
}

/// Holds the trending list shown to the user and drives manual refreshes.
///
/// Each refresh is tagged with a sequence number. When refreshes overlap, only the response
/// to the most recently issued request is applied; slower responses to earlier requests are
/// dropped so the view never regresses to stale data.
pub struct Dashboard {
    client: Arc<dyn StockDataClient>,
    limit: i32,
    issued: AtomicU64,
    view: tokio::sync::RwLock<DashboardView>,
}

impl Dashboard {
    pub fn new(client: Arc<dyn StockDataClient>, limit: i32) -> Self {
        Self {
            client,
            limit,
            issued: AtomicU64::new(0),
            view: tokio::sync::RwLock::new(DashboardView {
                state: LoadState::Loading,
                request_seq: 0,
                updated_at: Utc::now(),
            }),
        }
    }

    pub fn limit(&self) -> i32 {
        self.limit
    }

    pub async fn view(&self) -> DashboardView {
        self.view.read().await.clone()
    }

    /// Fetches once and returns the view as it stands after this request settles.
    pub async fn refresh(&self) -> DashboardView {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut view = self.view.write().await;
            view.state = LoadState::Loading;
            view.request_seq = seq;
            view.updated_at = Utc::now();
        }

        let result = self.client.fetch_trending(self.limit).await;

        let mut view = self.view.write().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if seq != latest {
            tracing::debug!(seq, latest, "discarding stale trending response");
            return view.clone();
        }

        view.state = match result {
            Ok(stocks) => {
                tracing::info!(seq, stocks = stocks.len(), source = self.client.source_name(), "dashboard refreshed");
                LoadState::Success(stocks)
            }
            Err(err) => {
                tracing::warn!(seq, error = %err, "dashboard refresh failed");
                LoadState::Error(err)
            }
        };
        view.request_seq = seq;
        view.updated_at = Utc::now();
        view.clone()
    }

    /// The stocks of the current view, if the last applied request succeeded.
    pub async fn stocks(&self) -> Option<Vec<AnnotatedStock>> {
        match &self.view.read().await.state {
            LoadState::Success(stocks) => Some(stocks.clone()),
            _ => None,
        }
    }
}
