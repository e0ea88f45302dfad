use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{
    AssetSentiment, Classification, DegradedReason, NewsArticle, Sentiment, SentimentBreakdown,
    SentimentReport,
};
use crate::services::llm_service::LlmService;
use crate::services::news_service::NewsService;

pub const NO_ASSETS_MESSAGE: &str = "Please select assets for sentiment analysis";
pub const NO_NEWS_MESSAGE: &str = "No news articles found for analysis";

/// Prompt asking the model for a single sentiment word.
pub fn build_sentiment_prompt(article: &NewsArticle) -> String {
    format!(
        "Analyze the sentiment of this financial news:\n\
         Headline: {}\n\
         Summary: {}\n\
         Respond with exactly one word - either 'positive', 'neutral', or 'negative':",
        article.title, article.summary
    )
}

/// Lowercase, drop periods and newlines, trim.
pub fn normalize_response(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['.', '\n'], "")
        .trim()
        .to_string()
}

/// Classify one article. Never fails: an unusable answer or a provider error
/// produces a degraded result that counts as neutral.
pub async fn classify_article(llm: &LlmService, article: &NewsArticle) -> Classification {
    match llm.generate_completion(build_sentiment_prompt(article)).await {
        Ok(raw) => {
            let label = normalize_response(&raw);
            match Sentiment::from_label(&label) {
                Some(sentiment) => Classification::Classified(sentiment),
                None => {
                    warn!("Unrecognized sentiment response '{}' for '{}', using neutral", raw, article.title);
                    Classification::Degraded(DegradedReason::InvalidResponse(raw))
                }
            }
        }
        Err(e) => {
            warn!("Sentiment classification failed for '{}': {}. Using neutral", article.title, e);
            Classification::Degraded(DegradedReason::ProviderError(e.to_string()))
        }
    }
}

/// Percentage of each label among `labels`. Labels that never occur are left
/// out; an empty input has no breakdown.
pub fn aggregate(labels: &[Sentiment]) -> Option<SentimentBreakdown> {
    if labels.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<Sentiment, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }

    let total = labels.len() as f64;
    Some(SentimentBreakdown {
        percentages: counts
            .into_iter()
            .map(|(label, count)| (label, count as f64 / total * 100.0))
            .collect(),
        article_count: labels.len(),
    })
}

/// Fetch news for every ticker, classify each article and aggregate per ticker.
///
/// Tickers whose news fetch fails or returns nothing are skipped. If every
/// ticker is skipped the report carries [`NO_NEWS_MESSAGE`].
pub async fn analyze_assets(
    news: &NewsService,
    llm: &LlmService,
    tickers: &[String],
) -> Result<SentimentReport, AppError> {
    if tickers.is_empty() {
        return Err(AppError::Validation(NO_ASSETS_MESSAGE.to_string()));
    }

    let mut assets = Vec::new();
    let mut skipped = Vec::new();

    for ticker in tickers {
        let articles = match news.fetch_ticker_news(ticker).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Failed to fetch news for {}: {}. Skipping", ticker, e);
                skipped.push(ticker.clone());
                continue;
            }
        };

        let mut labels = Vec::with_capacity(articles.len());
        let mut degraded_count = 0;
        for article in &articles {
            let classification = classify_article(llm, article).await;
            if classification.is_degraded() {
                degraded_count += 1;
            }
            labels.push(classification.label());
        }

        match aggregate(&labels) {
            Some(breakdown) => {
                info!(
                    "✓ Sentiment for {}: {} articles ({} degraded)",
                    ticker, breakdown.article_count, degraded_count
                );
                assets.push(AssetSentiment {
                    ticker: ticker.clone(),
                    breakdown,
                    degraded_count,
                });
            }
            None => {
                info!("No news articles for {}, skipping", ticker);
                skipped.push(ticker.clone());
            }
        }
    }

    let message = assets.is_empty().then(|| NO_NEWS_MESSAGE.to_string());

    Ok(SentimentReport { assets, skipped, message })
}
