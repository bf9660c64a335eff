//! Upstream language model: a streaming chat completion behind a trait
//!
//! `OpenAiProvider` speaks the OpenAI-compatible `/chat/completions` API with
//! `stream: true`, reading both `delta.content` and `delta.reasoning_content`.
//! Retries and the timeout cover opening the stream only; once chunks flow,
//! nothing here times them out.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::future;
use futures_util::stream::{BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::DONE_SENTINEL;

/// One incremental unit from the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDelta {
    pub reasoning: Option<String>,
    pub content: Option<String>,
}

impl ChatDelta {
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self { reasoning: Some(text.into()), content: None }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self { reasoning: None, content: Some(text.into()) }
    }
}

/// Ordered deltas, ending on exhaustion or on the first error
pub type DeltaStream = BoxStream<'static, Result<ChatDelta, UpstreamError>>;

/// A streaming chat completion provider
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open one stream for a system instruction and a user prompt.
    ///
    /// An `Err` here means nothing was streamed yet.
    async fn open_stream(&self, system: &str, prompt: &str) -> Result<DeltaStream, UpstreamError>;
}

// =============================================================================
// OPENAI-COMPATIBLE PROVIDER
// =============================================================================

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Attempts after the first
    pub max_retries: u32,
    /// Budget for establishing the stream, retries included
    pub timeout: Duration,
}

/// Streaming client for `/chat/completions`
pub struct OpenAiProvider {
    config: UpstreamConfig,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        if config.api_key.trim().is_empty() {
            return Err(UpstreamError::Config("API key is empty".into()));
        }
        if config.model.trim().is_empty() {
            return Err(UpstreamError::Config("model is empty".into()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Config(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, system: &str, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "stream": true,
        })
    }

    /// One attempt at opening the stream
    async fn send_once(&self, body: &Value) -> Result<reqwest::Response, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(UpstreamError::Status { status: status.as_u16(), body })
    }

    /// Bounded retries with exponential backoff on retryable failures
    async fn send_with_retries(&self, body: &Value) -> Result<reqwest::Response, UpstreamError> {
        let mut attempt = 0;
        loop {
            match self.send_once(body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(attempt = attempt + 1, error = %e, "upstream open failed, retrying in {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn open_stream(&self, system: &str, prompt: &str) -> Result<DeltaStream, UpstreamError> {
        let body = self.request_body(system, prompt);
        let budget = self.config.timeout;
        let response = tokio::time::timeout(budget, self.send_with_retries(&body))
            .await
            .map_err(|_| UpstreamError::Timeout(budget.as_millis() as u64))??;
        debug!(model = %self.config.model, "upstream stream opened");
        Ok(into_delta_stream(response))
    }
}

/// Frame the response body as SSE and decode each chunk
fn into_delta_stream(response: reqwest::Response) -> DeltaStream {
    response
        .bytes_stream()
        .eventsource()
        .take_while(|event| {
            future::ready(!matches!(event, Ok(event) if event.data.trim() == DONE_SENTINEL))
        })
        .filter_map(|event| {
            future::ready(match event {
                Ok(event) => parse_chunk(&event.data).transpose(),
                Err(e) => Some(Err(UpstreamError::Transport(e.to_string()))),
            })
        })
        .boxed()
}

// =============================================================================
// CHUNK DECODING
// =============================================================================

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

/// Decode one `data:` payload.
///
/// `Ok(None)` for keep-alive chunks with no choices.
pub(crate) fn parse_chunk(data: &str) -> Result<Option<ChatDelta>, UpstreamError> {
    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| UpstreamError::Decode(format!("{}: {}", e, data)))?;

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .unwrap_or("An error occurred during streaming");
        return Err(UpstreamError::Api(message.to_string()));
    }

    Ok(chunk.choices.into_iter().next().map(|choice| ChatDelta {
        reasoning: choice.delta.reasoning_content,
        content: choice.delta.content,
    }))
}
