use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{SentimentReport, SentimentRequest};
use crate::services::sentiment_service::{self, NO_ASSETS_MESSAGE};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(analyze_sentiment))
}

pub async fn analyze_sentiment(
    State(state): State<AppState>,
    Json(request): Json<SentimentRequest>,
) -> Result<Json<SentimentReport>, AppError> {
    info!("POST /api/sentiment - assets={:?}", request.assets);

    let assets = match request.assets {
        Some(list) if list.iter().all(|t| t.trim().is_empty()) => {
            return Err(AppError::Validation(NO_ASSETS_MESSAGE.to_string()));
        }
        other => state.select_assets(other)?,
    };

    let report = sentiment_service::analyze_assets(&state.news_service, &state.llm_service, &assets)
        .await
        .map_err(|e| {
            error!("Sentiment analysis failed for {:?}: {}", assets, e);
            e
        })?;

    if let Some(message) = &report.message {
        info!("{} ({:?})", message, assets);
    }

    Ok(Json(report))
}
