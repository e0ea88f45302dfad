use std::sync::Arc;

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::services::llm_service::LlmService;
use crate::services::news_service::NewsService;

#[derive(Clone)]
pub struct AppState {
    pub price_provider: Arc<dyn PriceProvider>,
    pub news_service: Arc<NewsService>,
    pub llm_service: Arc<LlmService>,
    /// Roster of selectable tickers
    pub tickers: Vec<String>,
    pub default_tickers: Vec<String>,
    pub optimizer_samples: usize,
    pub optimizer_max_samples: usize,
}

impl AppState {
    /// Resolve a requested selection against the roster. `None` picks the
    /// default selection; an empty list or an unknown ticker is rejected.
    pub fn select_assets(&self, requested: Option<Vec<String>>) -> Result<Vec<String>, AppError> {
        let Some(requested) = requested else {
            return Ok(self.default_tickers.clone());
        };

        let mut selected: Vec<String> = Vec::with_capacity(requested.len());
        for ticker in requested {
            let ticker = ticker.trim().to_uppercase();
            if ticker.is_empty() || selected.contains(&ticker) {
                continue;
            }
            if !self.tickers.contains(&ticker) {
                return Err(AppError::Validation(format!("Unknown ticker: {}", ticker)));
            }
            selected.push(ticker);
        }

        if selected.is_empty() {
            return Err(AppError::Validation("Please select at least one asset".to_string()));
        }
        Ok(selected)
    }
}
