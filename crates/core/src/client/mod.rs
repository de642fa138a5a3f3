pub mod error;
pub mod http;
pub mod types;

use crate::client::error::ApiError;
use crate::client::types::StockDetail;
use crate::domain::quote::AnnotatedStock;

pub use crate::client::http::HttpStockClient;

#[async_trait::async_trait]
pub trait StockDataClient: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// One round trip; normalized and annotated, at most `limit` entries.
    async fn fetch_trending(&self, limit: i32) -> Result<Vec<AnnotatedStock>, ApiError>;

    async fn fetch_stock_detail(&self, symbol: &str) -> Result<StockDetail, ApiError>;
}
