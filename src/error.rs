//! Error types for the divination service

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Misuse of the hexagram types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexagramError {
    /// A line value outside the three-coin range
    #[error("line value {0} is not a three-coin sum (6..=9)")]
    InvalidLineValue(u8),

    /// A seventh line was pushed
    #[error("hexagram already has six lines")]
    Full,

    /// Fewer than six lines where a complete hexagram is required
    #[error("hexagram has {0} of 6 lines")]
    Incomplete(usize),
}

/// Failures talking to the language-model provider
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    /// Provider settings are missing or unusable
    #[error("upstream configuration error: {0}")]
    Config(String),

    /// Connection or read failure
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status when opening the stream
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Error object sent in-band by the provider
    #[error("upstream API error: {0}")]
    Api(String),

    /// Chunk that could not be decoded
    #[error("upstream decode error: {0}")]
    Decode(String),

    /// Stream could not be established in time
    #[error("upstream did not respond within {0} ms")]
    Timeout(u64),
}

impl UpstreamError {
    /// Whether opening the stream again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Transport(_) | UpstreamError::Timeout(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Message safe to send to the browser. Undecodable chunks are only
    /// logged, since the raw payload can be large or echo provider internals.
    pub fn client_message(&self) -> String {
        match self {
            UpstreamError::Decode(_) => "upstream sent a malformed chunk".to_string(),
            other => other.to_string(),
        }
    }
}

/// Counter store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    /// Key holds a value of another kind (counter vs. set)
    #[error("key {key} holds the wrong kind of value")]
    WrongType { key: String },

    /// Store is unreachable or failed
    #[error("counter store error: {0}")]
    Backend(String),
}

/// Client-side reading failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadingError {
    /// Request could not be sent or the body could not be read
    #[error("reading request failed: {0}")]
    Request(String),

    /// Server refused the reading before streaming
    #[error("server returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// In-band error event
    #[error("reading failed: {0}")]
    Upstream(String),

    /// Stream ended without the terminal sentinel
    #[error("reading stream ended before completion")]
    Interrupted,
}

/// Errors returned by HTTP handlers before streaming starts
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or incomplete request
    #[error("{0}")]
    Validation(String),

    /// Upstream stream could not be opened
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Stats could not be read
    #[error(transparent)]
    Stats(#[from] CounterError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Stats(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Validation(message) => message.clone(),
            ApiError::Upstream(e) => e.client_message(),
            ApiError::Stats(_) => "Internal server error".to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
