//! HTTP client for the reading and stats endpoints
//!
//! Plays the browser's role: posts the request, then hands the event
//! stream body to a `ReadingSession` chunk by chunk.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::core::casting::CastReading;
use crate::core::decoder::{ReadingContext, ReadingSession};
use crate::error::ReadingError;
use crate::types::{
    IChingReadingRequest, PageViewRequest, PageViewResponse, StatsSnapshot, StreamEvent, TarotCard,
    TarotReadingRequest,
};

/// Error body of a refused request
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct DivinationClient {
    base_url: String,
    http: reqwest::Client,
}

impl DivinationClient {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:3000/api`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ReadingError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ReadingError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask about a cast hexagram, streaming events into `on_event`
    pub async fn iching_divination<F>(
        &self,
        question: &str,
        reading: CastReading,
        on_event: F,
    ) -> Result<ReadingSession, ReadingError>
    where
        F: FnMut(&StreamEvent),
    {
        let request = IChingReadingRequest::new(question, reading.to_payload());
        let mut session = ReadingSession::new(question, ReadingContext::Hexagram(reading));
        self.stream_reading("/iching/divination", &request, &mut session, on_event).await?;
        Ok(session)
    }

    /// Ask about drawn tarot cards, streaming events into `on_event`
    pub async fn tarot_reading<F>(
        &self,
        question: &str,
        cards: Vec<TarotCard>,
        on_event: F,
    ) -> Result<ReadingSession, ReadingError>
    where
        F: FnMut(&StreamEvent),
    {
        let request = TarotReadingRequest::new(question, &cards);
        let mut session = ReadingSession::new(question, ReadingContext::Tarot(cards));
        self.stream_reading("/tarot/reading", &request, &mut session, on_event).await?;
        Ok(session)
    }

    async fn stream_reading<B, F>(
        &self,
        path: &str,
        body: &B,
        session: &mut ReadingSession,
        on_event: F,
    ) -> Result<(), ReadingError>
    where
        B: serde::Serialize,
        F: FnMut(&StreamEvent),
    {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ReadingError::Request(e.to_string()))?;
        let response = Self::check(response).await?;
        debug!(path, "reading stream opened");
        session.consume(response.bytes_stream(), on_event).await
    }

    /// Current stats snapshot
    pub async fn fetch_stats(&self) -> Result<StatsSnapshot, ReadingError> {
        let response = self
            .http
            .get(self.url("/stats"))
            .send()
            .await
            .map_err(|e| ReadingError::Request(e.to_string()))?;
        Self::json(Self::check(response).await?).await
    }

    /// Report a page view
    pub async fn increment_page_view(&self, page: &str) -> Result<PageViewResponse, ReadingError> {
        let response = self
            .http
            .post(self.url("/stats/increment"))
            .json(&PageViewRequest { page: page.to_string() })
            .send()
            .await
            .map_err(|e| ReadingError::Request(e.to_string()))?;
        Self::json(Self::check(response).await?).await
    }

    /// Turn a non-success status into `Rejected`, using the `{error}` body
    /// when there is one
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ReadingError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(ReadingError::Rejected { status: status.as_u16(), message })
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ReadingError> {
        response
            .json()
            .await
            .map_err(|e| ReadingError::Request(e.to_string()))
    }
}
