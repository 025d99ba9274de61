//! LLM clients
//!
//! Two providers sit behind [`LlmClient`]: Groq's OpenAI-compatible chat
//! completions API and a local Ollama host. [`select_client`] picks one from
//! the resolved settings; [`RetryPolicy`] wraps generation with exponential
//! backoff.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::LlmSettings;

const GROQ_TIMEOUT: Duration = Duration::from_secs(60);
const OLLAMA_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Low temperature keeps JSON output stable
const TEMPERATURE: f32 = 0.1;
const GROQ_MAX_TOKENS: u32 = 4096;
const OLLAMA_NUM_PREDICT: u32 = 2048;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),
}

impl LlmError {
    /// Whether another attempt could succeed
    ///
    /// Client errors other than 408 and 429 repeat identically.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::Timeout | LlmError::Parse(_) => true,
            LlmError::Api { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            LlmError::UnknownProvider(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::Parse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// A text-generation backend
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `groq` or `ollama`
    fn provider(&self) -> &'static str;

    /// Model name recorded in sub-reports
    fn model(&self) -> &str;

    /// Complete `prompt`, optionally steered by a system prompt
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError>;

    /// True when the provider answers its cheapest endpoint with 200
    async fn health_check(&self) -> bool;
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Groq (OpenAI-compatible) chat completions client
pub struct GroqClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    /// `api_url` is the API base, e.g. `https://api.groq.com/openai/v1`
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(GROQ_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    fn provider(&self) -> &'static str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: GROQ_MAX_TOKENS,
            top_p: 1.0,
            stream: false,
        };

        info!(model = %self.model, "Sending request to Groq");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body: ChatResponse = ensure_success(response).await?.json().await?;

        match body.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content.unwrap_or_default()),
            None => {
                // Treated as an empty completion: the analysis degrades
                error!(model = %self.model, "Groq response has no choices");
                Ok(String::new())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let result = self
            .http
            .get(format!("{}/models", self.api_url))
            .bearer_auth(&self.api_key)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                error!(error = %e, "LLM health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama `/api/generate` client
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(OLLAMA_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: OLLAMA_NUM_PREDICT,
            },
        };

        info!(url = %self.base_url, model = %self.model, "Sending request to Ollama");
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let body: GenerateResponse = ensure_success(response).await?.json().await?;
        Ok(body.response)
    }

    async fn health_check(&self) -> bool {
        let result = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                error!(error = %e, "LLM health check failed");
                false
            }
        }
    }
}

/// Build the configured client
///
/// `groq` without an API key falls back to Ollama.
pub fn select_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>, LlmError> {
    let client: Arc<dyn LlmClient> = match settings.provider.as_str() {
        "groq" => match &settings.groq_api_key {
            Some(key) => Arc::new(GroqClient::new(
                settings.groq_api_url.as_str(),
                key.as_str(),
                settings.groq_model.as_str(),
            )?),
            None => {
                warn!("Groq API key not set, falling back to Ollama");
                Arc::new(OllamaClient::new(
                    settings.ollama_url.as_str(),
                    settings.ollama_model.as_str(),
                )?)
            }
        },
        "ollama" => Arc::new(OllamaClient::new(
            settings.ollama_url.as_str(),
            settings.ollama_model.as_str(),
        )?),
        other => return Err(LlmError::UnknownProvider(other.to_string())),
    };

    info!(provider = client.provider(), model = client.model(), "LLM client initialized");
    Ok(client)
}

/// Exponential backoff for LLM calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay after the `attempt`-th failure (1-based), doubling up to the cap
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails permanently or attempts run out
    ///
    /// The last error is returned when every attempt fails.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if attempt > 1 {
                debug!(operation = operation_name, attempt, "Retrying LLM call");
            }

            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) if !err.is_retryable() || attempt >= max_attempts => {
                    error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "LLM call failed"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "LLM call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
