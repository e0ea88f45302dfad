use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{
    AnnualizedMetrics, OptimizationRequest, OptimizationResult, PerformanceWindow,
    PortfolioMetricsRequest, PortfolioMetricsResponse,
};
use crate::routes::performance::window_for;
use crate::services::{optimization_service, portfolio_service, price_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics", post(compute_metrics))
        .route("/optimize", post(optimize))
}

/// Fetch prices for the selection and annualize their daily returns.
async fn annualized_for(
    state: &AppState,
    assets: &[String],
    window: &PerformanceWindow,
) -> Result<AnnualizedMetrics, AppError> {
    let table = price_service::fetch_price_table(state.price_provider.as_ref(), assets, window)
        .await
        .map_err(|e| {
            match &e {
                AppError::RateLimited => warn!("Rate limited when fetching prices for {:?}", assets),
                _ => error!("Failed to fetch prices for {:?} ({}): {}", assets, window.label, e),
            }
            e
        })?;

    let returns = portfolio_service::daily_returns(&table);
    let metrics = portfolio_service::compute_annualized_metrics(&returns).map_err(|e| {
        warn!("Cannot annualize returns for {:?} ({}): {}", assets, window.label, e);
        AppError::from(e)
    })?;
    Ok(metrics)
}

fn weight_map(assets: &[String], weights: &[f64]) -> BTreeMap<String, f64> {
    assets.iter().cloned().zip(weights.iter().copied()).collect()
}

pub async fn compute_metrics(
    State(state): State<AppState>,
    Json(request): Json<PortfolioMetricsRequest>,
) -> Result<Json<PortfolioMetricsResponse>, AppError> {
    info!("POST /api/portfolio/metrics - assets={:?}", request.assets);

    let assets = state.select_assets(request.assets)?;
    let window = window_for(request.year, request.month, Utc::now().date_naive())?;
    let raw_weights = portfolio_service::weights_for_assets(&assets, request.weights.as_ref())?;

    let annualized = annualized_for(&state, &assets, &window).await?;
    let weights = portfolio_service::normalize_weights(&annualized.assets, &raw_weights)?;
    let metrics = portfolio_service::compute_portfolio_performance(&raw_weights, &annualized)?;

    info!(
        "✓ Portfolio metrics for {:?} ({}): return {:.4}, volatility {:.4}, sharpe {:.4}",
        assets, window.label, metrics.expected_return, metrics.volatility, metrics.sharpe_ratio
    );

    Ok(Json(PortfolioMetricsResponse {
        weights: weight_map(&annualized.assets, &weights.to_vec()),
        expected_returns: annualized.expected_returns_map(),
        covariance: annualized.covariance_map(),
        observations: annualized.observations,
        metrics,
        window,
    }))
}

pub async fn optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizationRequest>,
) -> Result<Json<OptimizationResult>, AppError> {
    info!("POST /api/portfolio/optimize - assets={:?} samples={:?}", request.assets, request.samples);

    let assets = state.select_assets(request.assets)?;
    let window = window_for(request.year, request.month, Utc::now().date_naive())?;
    let samples = request.samples.unwrap_or(state.optimizer_samples);
    if samples > state.optimizer_max_samples {
        return Err(AppError::Validation(format!(
            "samples must be at most {}",
            state.optimizer_max_samples
        )));
    }
    let seed = request.seed.unwrap_or_else(rand::random);

    let annualized = annualized_for(&state, &assets, &window).await?;
    let (annualized, best) = tokio::task::spawn_blocking(move || {
        let best = optimization_service::optimize_weights(&annualized, samples, seed);
        (annualized, best)
    })
    .await
    .map_err(|e| {
        error!("Optimizer task failed: {}", e);
        AppError::External("Optimizer task failed".to_string())
    })?;
    let best = best?;

    Ok(Json(OptimizationResult {
        window,
        weights: weight_map(&annualized.assets, &best.weights),
        metrics: best.metrics,
        samples,
        observations: annualized.observations,
    }))
}
