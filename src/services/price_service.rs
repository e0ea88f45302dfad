use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use crate::models::{PerformanceWindow, PriceRow, PriceTable};

/// Fetch adjusted closes for every ticker in `window` and align them by date.
///
/// Provider errors are propagated. A ticker with no rows keeps an all-`None`
/// column; if no ticker has any rows the whole request fails with
/// [`PriceProviderError::EmptyPriceData`].
pub async fn fetch_price_table(
    provider: &dyn PriceProvider,
    tickers: &[String],
    window: &PerformanceWindow,
) -> Result<PriceTable, AppError> {
    let mut series = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        let points = provider
            .fetch_daily_history(ticker, window.start, window.end)
            .await
            .map_err(|e| {
                match &e {
                    PriceProviderError::RateLimited => warn!("Rate limited when fetching prices for {}", ticker),
                    _ => error!("Failed to fetch prices for {}: {}", ticker, e),
                }
                e
            })?;

        if points.is_empty() {
            warn!("No price data for {} between {} and {}", ticker, window.start, window.end);
        } else {
            info!("✓ Fetched {} price points for {}", points.len(), ticker);
        }

        series.push((ticker.clone(), points));
    }

    let table = align_series(series);
    if table.is_empty() {
        return Err(PriceProviderError::EmptyPriceData(format!(
            "No price data retrieved for {} between {} and {}",
            tickers.join(", "),
            window.start,
            window.end
        ))
        .into());
    }

    Ok(table)
}

/// Align per-ticker series on the union of their dates. Duplicate dates within
/// one series keep the last observation.
pub fn align_series(series: Vec<(String, Vec<ExternalPricePoint>)>) -> PriceTable {
    let width = series.len();
    let mut by_date: BTreeMap<chrono::NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut assets = Vec::with_capacity(width);

    for (idx, (ticker, points)) in series.into_iter().enumerate() {
        assets.push(ticker);
        for point in points {
            by_date.entry(point.date).or_insert_with(|| vec![None; width])[idx] = Some(point.adj_close);
        }
    }

    PriceTable {
        assets,
        rows: by_date
            .into_iter()
            .map(|(date, prices)| PriceRow { date, prices })
            .collect(),
    }
}
