mod news;
mod performance;
mod portfolio;
mod price_point;
mod sentiment;

pub use news::{NewsArticle, Sentiment};
pub use performance::{AssetRoster, MonthOption, PerformanceQuery, PerformanceResponse, PerformanceWindow, WindowSelection};
pub use portfolio::{
    AnnualizedMetrics, OptimizationRequest, OptimizationResult, PortfolioMetrics,
    PortfolioMetricsRequest, PortfolioMetricsResponse,
};
pub use price_point::{PricePoint, PriceRow, PriceSeries, PriceTable, ReturnTable};
pub use sentiment::{
    AssetSentiment, Classification, DegradedReason, SentimentBreakdown, SentimentReport,
    SentimentRequest,
};
