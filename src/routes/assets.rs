use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use tracing::info;

use crate::models::AssetRoster;
use crate::services::performance_service::{month_options, year_options};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_roster))
}

pub async fn get_roster(State(state): State<AppState>) -> Json<AssetRoster> {
    info!("GET /api/assets - Getting ticker roster");
    let today = Utc::now().date_naive();

    Json(AssetRoster {
        tickers: state.tickers.clone(),
        default_selection: state.default_tickers.clone(),
        years: year_options(today),
        month_options: month_options(today.year(), today),
        default_year: today.year(),
        default_month: today.month(),
    })
}
