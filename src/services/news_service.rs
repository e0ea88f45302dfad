use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::NewsError;
use crate::models::NewsArticle;

/// Configuration for news service
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub provider: String,
    pub api_key: Option<String>,
    /// Articles requested per ticker
    pub page_size: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            provider: "newsapi".to_string(),
            api_key: None,
            page_size: 5,
        }
    }
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, NewsError>;
}

/// NewsAPI.org `/v2/everything` provider
pub struct NewsApiProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl NewsApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://newsapi.org".to_string(),
            client: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<NewsApiSource>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// Keep only articles that carry both a headline and a summary.
fn into_articles(items: Vec<NewsApiArticle>) -> Vec<NewsArticle> {
    items
        .into_iter()
        .filter_map(|item| {
            let title = item.title.filter(|t| !t.trim().is_empty())?;
            let summary = item.description.filter(|d| !d.trim().is_empty())?;
            Some(NewsArticle {
                title,
                summary,
                url: item.url,
                source: item.source.and_then(|s| s.name),
                published_at: item.published_at,
            })
        })
        .collect()
}

fn parse_response(body: NewsApiResponse) -> Result<Vec<NewsArticle>, NewsError> {
    if body.status != "ok" {
        let code = body.code.unwrap_or_default();
        if code == "rateLimited" {
            return Err(NewsError::RateLimited);
        }
        return Err(NewsError::Api(format!(
            "{}: {}",
            code,
            body.message.unwrap_or_else(|| "unknown error".to_string())
        )));
    }
    Ok(into_articles(body.articles))
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, NewsError> {
        info!("Fetching news from NewsAPI for query: {}", query);

        let response = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .header("User-Agent", "portfolio-insights/0.1")
            .query(&[
                ("q", query.to_string()),
                ("language", "en".to_string()),
                ("sortBy", "relevancy".to_string()),
                ("pageSize", max_results.min(100).to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("NewsAPI request failed: {}", e);
                NewsError::Network(e.to_string())
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NewsError::RateLimited);
        }

        // NewsAPI reports errors in the JSON body with a non-2xx status too
        let body: NewsApiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse NewsAPI response: {}", e);
            NewsError::Parse(e.to_string())
        })?;

        let articles = parse_response(body)?;
        info!("Fetched {} usable news articles for {}", articles.len(), query);
        Ok(articles)
    }
}

/// Main news service
pub struct NewsService {
    config: NewsConfig,
    provider: Option<Arc<dyn NewsProvider>>,
}

impl NewsService {
    pub fn new(config: NewsConfig) -> Self {
        let provider: Option<Arc<dyn NewsProvider>> = match (&config.api_key, config.provider.as_str()) {
            (Some(key), "newsapi") if !key.is_empty() => {
                info!("Initializing NewsAPI news provider");
                Some(Arc::new(NewsApiProvider::new(key.clone())))
            }
            (Some(_), other) if other != "newsapi" => {
                warn!("Unknown news provider: {}", other);
                None
            }
            _ => {
                warn!("No news API key provided, news service disabled");
                None
            }
        };

        Self { config, provider }
    }

    pub fn with_provider(config: NewsConfig, provider: Arc<dyn NewsProvider>) -> Self {
        Self { config, provider: Some(provider) }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Fetch at most `page_size` articles for a ticker symbol.
    pub async fn fetch_ticker_news(&self, ticker: &str) -> Result<Vec<NewsArticle>, NewsError> {
        let provider = self.provider.as_ref()
            .ok_or_else(|| NewsError::Api("News service is not enabled".to_string()))?;

        let mut articles = provider.fetch_news(ticker, self.config.page_size).await?;
        articles.truncate(self.config.page_size);
        Ok(articles)
    }
}
