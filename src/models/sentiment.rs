use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::news::Sentiment;

/// Why a classification fell back to neutral.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DegradedReason {
    /// The model answered with something other than the three labels.
    InvalidResponse(String),
    /// The text-generation provider call failed.
    ProviderError(String),
}

/// Outcome of classifying one article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Classified(Sentiment),
    Degraded(DegradedReason),
}

impl Classification {
    /// Effective label; degraded results count as neutral.
    pub fn label(&self) -> Sentiment {
        match self {
            Classification::Classified(sentiment) => *sentiment,
            Classification::Degraded(_) => Sentiment::Neutral,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Classification::Degraded(_))
    }
}

/// Percentage of articles per label. Labels that never occurred are absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentBreakdown {
    pub percentages: BTreeMap<Sentiment, f64>,
    pub article_count: usize,
}

impl SentimentBreakdown {
    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        self.percentages.get(&sentiment).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSentiment {
    pub ticker: String,
    pub breakdown: SentimentBreakdown,
    pub degraded_count: usize,
}

/// Sentiment for every requested asset that had news.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentReport {
    pub assets: Vec<AssetSentiment>,
    /// Tickers excluded because no news was available
    pub skipped: Vec<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentRequest {
    pub assets: Option<Vec<String>>,
}
