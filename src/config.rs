use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::services::llm_service::LlmConfig;
use crate::services::news_service::NewsConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TICKERS: &str = "AAPL,GOOGL,MSFT,AMZN,TSLA,NFLX,NVDA";
pub const DEFAULT_SELECTION: &str = "AAPL,AMZN,GOOGL";
pub const DEFAULT_OPTIMIZER_SAMPLES: usize = 5000;
pub const DEFAULT_OPTIMIZER_MAX_SAMPLES: usize = 100_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub tickers: Vec<String>,
    pub default_tickers: Vec<String>,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub optimizer_samples: usize,
    /// Largest sample count a single optimize request may ask for
    pub optimizer_max_samples: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let bind_addr = parse_or(get("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR)?;

        let tickers = parse_tickers(&get("TICKERS").unwrap_or_else(|| DEFAULT_TICKERS.to_string()));
        if tickers.is_empty() {
            return Err(ConfigError::Invalid {
                var: "TICKERS".to_string(),
                reason: "roster is empty".to_string(),
            });
        }

        let default_tickers =
            parse_tickers(&get("DEFAULT_TICKERS").unwrap_or_else(|| DEFAULT_SELECTION.to_string()));
        if let Some(unknown) = default_tickers.iter().find(|t| !tickers.contains(t)) {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_TICKERS".to_string(),
                reason: format!("{} is not in TICKERS", unknown),
            });
        }

        let news = NewsConfig {
            api_key: Some(required("NEWS_API_KEY")?),
            page_size: parse_or(get("NEWS_PAGE_SIZE"), "NEWS_PAGE_SIZE", "5")?,
            ..NewsConfig::default()
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            api_key: Some(required("COHERE_API_KEY")?),
            model: get("LLM_MODEL").unwrap_or(llm_defaults.model.clone()),
            max_tokens: parse_or(get("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", "5")?,
            temperature: parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", "0.3")?,
            ..llm_defaults
        };

        let optimizer_samples: usize = parse_or(
            get("OPTIMIZER_SAMPLES"),
            "OPTIMIZER_SAMPLES",
            &DEFAULT_OPTIMIZER_SAMPLES.to_string(),
        )?;
        if optimizer_samples == 0 {
            return Err(ConfigError::Invalid {
                var: "OPTIMIZER_SAMPLES".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let optimizer_max_samples: usize = parse_or(
            get("OPTIMIZER_MAX_SAMPLES"),
            "OPTIMIZER_MAX_SAMPLES",
            &DEFAULT_OPTIMIZER_MAX_SAMPLES.to_string(),
        )?;
        if optimizer_samples > optimizer_max_samples {
            return Err(ConfigError::Invalid {
                var: "OPTIMIZER_SAMPLES".to_string(),
                reason: format!("exceeds OPTIMIZER_MAX_SAMPLES ({})", optimizer_max_samples),
            });
        }

        Ok(Self {
            bind_addr,
            tickers,
            default_tickers,
            news,
            llm,
            optimizer_samples,
            optimizer_max_samples,
        })
    }
}

/// Split a comma-separated list into trimmed, uppercased, de-duplicated symbols.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()) {
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

fn parse_or<T>(value: Option<String>, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value.unwrap_or_else(|| default.to_string());
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("'{}': {}", raw, e),
    })
}
