use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::LlmError;

/// Configuration for LLM service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "cohere".to_string(),
            api_key: None,
            model: "command".to_string(),
            max_tokens: 5,
            temperature: 0.3,
            max_retries: 3,
        }
    }
}

/// Trait for text-generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError>;
}

/// Run `op` up to `max_attempts` times, doubling the delay after each failure.
/// Errors that are not [`LlmError::is_retryable`] are returned immediately.
pub async fn with_retry<T, F, Fut>(
    max_attempts: u32,
    initial_delay: Duration,
    mut op: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    let mut delay = initial_delay;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if !e.is_retryable() {
                    error!("LLM call failed with non-retryable error: {}", e);
                    return Err(e);
                }
                if attempt >= max_attempts {
                    error!("LLM call failed after {} attempts: {}", max_attempts, e);
                    return Err(e);
                }

                warn!("LLM call failed (attempt {}/{}): {}. Retrying in {:?}...",
                      attempt, max_attempts, e, delay);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CohereGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    temperature: f32,
    stop_sequences: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CohereGenerateResponse {
    generations: Vec<CohereGeneration>,
}

#[derive(Debug, Deserialize)]
struct CohereGeneration {
    text: String,
}

/// Cohere `generate` endpoint
pub struct CohereProvider {
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    max_retries: u32,
    base_url: String,
    client: Client,
}

impl CohereProvider {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            base_url: "https://api.cohere.ai".to_string(),
            client,
        })
    }

    async fn call_generate(&self, prompt: &str) -> Result<CohereGenerateResponse, LlmError> {
        let request = CohereGenerateRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop_sequences: vec!["\n", "."],
        };

        let response = self.client
            .post(format!("{}/v1/generate", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        response.json::<CohereGenerateResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for CohereProvider {
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        info!("Generating LLM completion (model: {}, max_tokens: {})", self.model, self.max_tokens);

        let prompt = prompt.as_str();
        let response = with_retry(self.max_retries, Duration::from_secs(1), move || {
            self.call_generate(prompt)
        })
        .await?;

        response.generations
            .into_iter()
            .next()
            .map(|g| g.text)
            .ok_or_else(|| LlmError::InvalidResponse("No generations in response".to_string()))
    }
}

/// LLM service with provider abstraction
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Self {
        let provider = match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                info!("Initializing LLM service with provider: {}", config.provider);
                match config.provider.as_str() {
                    "cohere" => match CohereProvider::new(&config, key.to_string()) {
                        Ok(provider) => Some(Arc::new(provider) as Arc<dyn LlmProvider>),
                        Err(e) => {
                            error!("Failed to create Cohere client: {}. LLM features disabled.", e);
                            None
                        }
                    },
                    _ => {
                        warn!("Unknown LLM provider: {}. LLM features disabled.", config.provider);
                        None
                    }
                }
            }
            _ => {
                warn!("LLM API key not configured. LLM features disabled.");
                None
            }
        };

        Self { provider }
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        let provider = self.provider.as_ref()
            .ok_or(LlmError::Disabled)?;

        provider.generate_completion(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "cohere");
        assert_eq!(config.model, "command");
        assert_eq!(config.max_tokens, 5);
        assert_eq!(config.temperature, 0.3);
    }

    #[test]
    fn test_llm_service_disabled_without_key() {
        let service = LlmService::new(LlmConfig::default());
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_unknown_provider_is_disabled() {
        let config = LlmConfig {
            provider: "mystery".to_string(),
            api_key: Some("key".to_string()),
            ..LlmConfig::default()
        };
        assert!(!LlmService::new(config).is_enabled());
    }

    #[tokio::test]
    async fn test_llm_service_returns_disabled_error() {
        let service = LlmService::new(LlmConfig::default());

        let result = service.generate_completion("test".to_string()).await;
        assert!(matches!(result, Err(LlmError::Disabled)));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);

        let result = with_retry(3, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(LlmError::Timeout)
                } else {
                    Ok("positive".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "positive");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);

        let result: Result<String, LlmError> = with_retry(2, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::RateLimited) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::RateLimited)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_errors() {
        let calls = AtomicU32::new(0);

        let result: Result<String, LlmError> = with_retry(3, Duration::from_secs(60), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::ApiError("HTTP 401 Unauthorized: invalid api token".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(LlmError::ApiError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        calls.store(0, Ordering::SeqCst);
        let result: Result<String, LlmError> = with_retry(3, Duration::from_secs(60), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::InvalidResponse("No generations in response".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
