use std::sync::Arc;

use tokio::net::TcpListener;

use portfolio_insights::app;
use portfolio_insights::config::AppConfig;
use portfolio_insights::external::price_provider::PriceProvider;
use portfolio_insights::external::yahoofinance::YahooFinanceProvider;
use portfolio_insights::logging::{init_logging, LoggingConfig};
use portfolio_insights::services::llm_service::LlmService;
use portfolio_insights::services::news_service::NewsService;
use portfolio_insights::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    tracing::info!("📊 Using price provider: Yahoo Finance");
    let price_provider: Arc<dyn PriceProvider> = Arc::new(YahooFinanceProvider::new());

    let news_service = NewsService::new(config.news.clone());
    let llm_service = LlmService::new(config.llm.clone());
    tracing::info!(
        "📰 News provider enabled: {}, 🤖 LLM provider enabled: {}",
        news_service.is_enabled(),
        llm_service.is_enabled()
    );

    let state = AppState {
        price_provider,
        news_service: Arc::new(news_service),
        llm_service: Arc::new(llm_service),
        tickers: config.tickers.clone(),
        default_tickers: config.default_tickers.clone(),
        optimizer_samples: config.optimizer_samples,
        optimizer_max_samples: config.optimizer_max_samples,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Portfolio insights backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
