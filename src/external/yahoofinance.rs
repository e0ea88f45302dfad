use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::info;

/// Yahoo Finance chart API provider.
///
/// No API key required. Adjusted closes come from the `adjclose` indicator;
/// when Yahoo omits it (some indices and funds) the raw close is used instead.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url("https://query1.finance.yahoo.com")
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; PortfolioInsights/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for YahooFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Epoch seconds bounding `[start, end]` inclusive (`period2` is exclusive on Yahoo's side).
fn period_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
    let period2 = (end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc().timestamp();
    (period1, period2)
}

fn parse_chart_body(
    body: YahooChartResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
    if let Some(error) = body.chart.error {
        if error.description.contains("No data found") {
            return Ok(Vec::new());
        }
        return Err(PriceProviderError::BadResponse(error.description));
    }

    let result = body.chart.result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| PriceProviderError::BadResponse("No results in response".into()))?;

    let closes = match result.indicators.adjclose.into_iter().next() {
        Some(adj) => adj.adjclose,
        None => result.indicators.quote
            .into_iter()
            .next()
            .ok_or_else(|| PriceProviderError::BadResponse("No quote data in response".into()))?
            .close,
    };

    if result.timestamp.len() != closes.len() {
        return Err(PriceProviderError::Parse(
            "Timestamp and close price arrays have different lengths".into()
        ));
    }

    let mut points: Vec<ExternalPricePoint> = result.timestamp
        .iter()
        .zip(closes)
        .filter_map(|(timestamp, close)| {
            // null closes are market holidays or halted sessions
            let adj_close = close?;
            let date = chrono::DateTime::from_timestamp(*timestamp, 0)?.date_naive();
            Some(ExternalPricePoint { date, adj_close })
        })
        .filter(|p| p.date >= start && p.date <= end)
        .collect();

    points.sort_by(|a, b| a.date.cmp(&b.date));
    points.dedup_by(|a, b| a.date == b.date);

    Ok(points)
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let (period1, period2) = period_bounds(start, end);

        info!("Fetching {} adjusted closes from Yahoo Finance ({} to {})", ticker, start, end);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("interval", "1d".to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(
                format!("HTTP {}", resp.status())
            ));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        parse_chart_body(body, start, end)
    }
}
