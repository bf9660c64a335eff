//! Client side of the stream: byte chunks → events → reading buffers
//!
//! Chunk boundaries fall anywhere, including inside a line or inside a
//! multi-byte character. The decoder buffers bytes until a newline, then
//! decodes the whole line. Only lines starting with `data: ` are events.

use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use std::fmt::Display;
use tracing::warn;

use crate::core::casting::CastReading;
use crate::error::ReadingError;
use crate::types::{StreamEvent, TarotCard};
use crate::EVENT_PREFIX;

/// Incremental line decoder
#[derive(Debug, Default)]
pub struct EventDecoder {
    pending: Vec<u8>,
    skipped: usize,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns events for every line it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(event) = self.decode_line(&line[..newline]) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left after the final chunk
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let line = std::mem::take(&mut self.pending);
        self.decode_line(&line)
    }

    /// Malformed event lines dropped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<StreamEvent> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches('\r');
        let data = text.strip_prefix(EVENT_PREFIX)?.trim();
        if data.is_empty() {
            return None;
        }
        match StreamEvent::parse_data(data) {
            Ok(event) => Some(event),
            Err(e) => {
                self.skipped += 1;
                warn!(error = %e, data, "skipping malformed stream event");
                None
            }
        }
    }
}

/// What a session should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished,
}

/// What was asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingContext {
    Hexagram(CastReading),
    Tarot(Vec<TarotCard>),
}

/// Client-held state of one reading
#[derive(Debug, Clone)]
pub struct ReadingSession {
    question: String,
    context: ReadingContext,
    reasoning: String,
    answer: String,
    streaming: bool,
}

impl ReadingSession {
    pub fn new(question: impl Into<String>, context: ReadingContext) -> Self {
        Self {
            question: question.into(),
            context,
            reasoning: String::new(),
            answer: String::new(),
            streaming: false,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn context(&self) -> &ReadingContext {
        &self.context
    }

    /// Accumulated thinking text
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Accumulated final answer
    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Fold one event into the buffers
    pub fn apply(&mut self, event: StreamEvent) -> Result<Flow, ReadingError> {
        match event {
            StreamEvent::Reasoning(text) => {
                self.reasoning.push_str(&text);
                Ok(Flow::Continue)
            }
            StreamEvent::Content(text) => {
                self.answer.push_str(&text);
                Ok(Flow::Continue)
            }
            StreamEvent::Error(message) => {
                self.streaming = false;
                Err(ReadingError::Upstream(message))
            }
            StreamEvent::Done => {
                self.streaming = false;
                Ok(Flow::Finished)
            }
        }
    }

    /// Read a response body to the end, calling `on_event` for each event
    /// before it is applied.
    ///
    /// Returns once `[DONE]` arrives; an `error` event, a body read failure,
    /// or a body that ends early is an error.
    pub async fn consume<S, E, F>(&mut self, body: S, mut on_event: F) -> Result<(), ReadingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
        F: FnMut(&StreamEvent),
    {
        self.streaming = true;
        let result = self.consume_inner(body, &mut on_event).await;
        self.streaming = false;
        result
    }

    async fn consume_inner<S, E, F>(&mut self, body: S, on_event: &mut F) -> Result<(), ReadingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
        F: FnMut(&StreamEvent),
    {
        let mut body = std::pin::pin!(body);
        let mut decoder = EventDecoder::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ReadingError::Request(e.to_string()))?;
            for event in decoder.feed(&chunk) {
                on_event(&event);
                if self.apply(event)? == Flow::Finished {
                    return Ok(());
                }
            }
        }
        if let Some(event) = decoder.finish() {
            on_event(&event);
            if self.apply(event)? == Flow::Finished {
                return Ok(());
            }
        }
        Err(ReadingError::Interrupted)
    }
}
