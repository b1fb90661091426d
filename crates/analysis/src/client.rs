//! Blocking client for a hosted text-completions endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.together.xyz/v1/completions";
pub const DEFAULT_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TOP_P: f32 = 0.9;

/// Failure of a single completion call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("LLM API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("failed to reach the completions endpoint: {0}")]
    Transport(String),

    #[error("completions endpoint returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Whether the endpoint rejected our credentials.
    ///
    /// These are configuration problems and must not be absorbed as a
    /// per-slide classification failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

impl From<ModelError> for thesis_core::Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Api { status, body } => Self::ModelApi { status, body },
            other => Self::ModelTransport(other.to_string()),
        }
    }
}

/// Parameters of one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl CompletionRequest {
    /// A request with the default sampling parameters.
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

/// Anything that can turn a prompt into generated text.
///
/// Implementations issue exactly one request per call: no retries.
pub trait ModelClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        (**self).complete(request)
    }
}

/// Connection settings for [`CompletionClient`].
#[derive(Clone)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ModelConfig {
    /// Settings for the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// Blocking HTTP client for an OpenAI-style `/v1/completions` endpoint.
#[derive(Debug)]
pub struct CompletionClient {
    http: reqwest::blocking::Client,
    config: ModelConfig,
}

impl CompletionClient {
    /// Build a client. Fails immediately when no API key is configured.
    pub fn new(config: ModelConfig) -> thesis_core::Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(thesis_core::Error::Config(
                "an API key is required (set TOGETHER_API_KEY)".to_string(),
            ));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| thesis_core::Error::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ModelClient for CompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = CompletionBody {
            model: &self.config.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        };

        log::debug!(
            "POST {} (prompt {} chars, max_tokens {})",
            self.config.endpoint,
            request.prompt.len(),
            request.max_tokens
        );

        let resp = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(self.config.api_key.trim())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.config.timeout.as_secs())
                } else {
                    ModelError::Transport(e.to_string())
                }
            })?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .map_err(|e| ModelError::Transport(format!("failed to read response body: {}", e)))?;

        interpret_response(status, &text)
    }
}

/// Map an HTTP status and body to the generated text.
///
/// Only `choices[0].text` is used, trimmed.
fn interpret_response(status: u16, body: &str) -> Result<String, ModelError> {
    if !(200..300).contains(&status) {
        return Err(ModelError::Api {
            status,
            body: body.to_string(),
        });
    }

    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::InvalidResponse(format!("invalid JSON: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text.trim().to_string())
        .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))
}
