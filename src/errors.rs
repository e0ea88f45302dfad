use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

use crate::external::price_provider::PriceProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Precondition violated: {0}")]
    Precondition(#[from] StatsError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
}

/// Precondition violations raised by the portfolio statistics core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("expected {expected} weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("weights sum to zero")]
    ZeroWeightSum,
    #[error("weight for {asset} is negative or not finite: {weight}")]
    InvalidWeight { asset: String, weight: f64 },
    #[error("need at least 2 complete return rows, got {0}")]
    InsufficientObservations(usize),
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("network error: {0}")]
    Network(String),
    #[error("news provider returned error: {0}")]
    Api(String),
    #[error("failed to parse news response: {0}")]
    Parse(String),
    #[error("rate limited")]
    RateLimited,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM features are disabled")]
    Disabled,
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("rate limited")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Timeout | LlmError::NetworkError(_) | LlmError::RateLimited)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Precondition(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            },
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
        }
    }
}

impl From<PriceProviderError> for AppError {
    fn from(value: PriceProviderError) -> Self {
        match value {
            PriceProviderError::RateLimited => AppError::RateLimited,
            PriceProviderError::EmptyPriceData(msg) => AppError::NotFound(msg),
            other => AppError::External(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_error_maps_to_unprocessable() {
        let err: AppError = StatsError::ZeroWeightSum.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
    }

    #[test]
    fn test_only_transient_llm_errors_are_retryable() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::NetworkError("reset".into()).is_retryable());
        assert!(LlmError::RateLimited.is_retryable());
        assert!(!LlmError::ApiError("HTTP 401".into()).is_retryable());
        assert!(!LlmError::InvalidResponse("empty".into()).is_retryable());
        assert!(!LlmError::Disabled.is_retryable());
    }

    #[test]
    fn test_empty_price_data_is_not_found() {
        let err: AppError = PriceProviderError::EmptyPriceData("no rows".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
