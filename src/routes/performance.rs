use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{PerformanceQuery, PerformanceResponse, PerformanceWindow, WindowSelection};
use crate::services::performance_service::{month_options, resolve_window};
use crate::services::price_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_performance))
}

/// Resolve an optional year/month pair; the year defaults to the current one.
pub(crate) fn window_for(
    year: Option<i32>,
    month: Option<u32>,
    today: NaiveDate,
) -> Result<PerformanceWindow, AppError> {
    resolve_window(
        WindowSelection {
            year: year.unwrap_or(today.year()),
            month,
        },
        today,
    )
}

pub async fn get_performance(
    State(state): State<AppState>,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<PerformanceResponse>, AppError> {
    info!("GET /api/performance - assets={:?} year={:?} month={:?}", query.assets, query.year, query.month);

    let requested = query
        .assets
        .map(|raw| raw.split(',').map(str::to_string).collect::<Vec<_>>());
    let assets = state.select_assets(requested)?;

    let today = Utc::now().date_naive();
    let window = window_for(query.year, query.month, today)?;

    let table = price_service::fetch_price_table(state.price_provider.as_ref(), &assets, &window)
        .await
        .map_err(|e| {
            match &e {
                AppError::RateLimited => warn!("Rate limited when fetching performance for {:?}", assets),
                _ => error!("Failed to fetch performance for {:?} ({}): {}", assets, window.label, e),
            }
            e
        })?;

    Ok(Json(PerformanceResponse {
        month_options: month_options(window.year, today),
        series: table.series(),
        window,
    }))
}
