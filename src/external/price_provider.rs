use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// One adjusted-close observation as returned by a market-data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no price data: {0}")]
    EmptyPriceData(String),
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily adjusted closes for `ticker` between `start` and `end`, both inclusive,
    /// ascending by date.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError>;
}
