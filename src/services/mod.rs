pub mod llm_service;
pub mod news_service;
pub mod optimization_service;
pub mod performance_service;
pub mod portfolio_service;
pub mod price_service;
pub mod sentiment_service;
