//! Stream events relayed from the model to the browser
//!
//! Wire form, one event per line pair:
//!
//! ```text
//! data: {"type":"reasoning","content":"..."}
//!
//! data: [DONE]
//! ```

use serde::{Deserialize, Serialize};

use crate::{DONE_SENTINEL, EVENT_PREFIX};

/// One relayed event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Thinking text, shown apart from the answer
    Reasoning(String),
    /// Final answer text
    Content(String),
    /// Stream failed; nothing follows
    Error(String),
    /// Stream finished; nothing follows
    Done,
}

/// JSON body of the non-sentinel events
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
enum EventPayload {
    Reasoning(String),
    Content(String),
    Error(String),
}

impl StreamEvent {
    /// Whether the stream ends after this event
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error(_) | StreamEvent::Done)
    }

    /// Text after the `data: ` prefix
    pub fn to_data(&self) -> String {
        let payload = match self {
            StreamEvent::Done => return DONE_SENTINEL.to_string(),
            StreamEvent::Reasoning(text) => EventPayload::Reasoning(text.clone()),
            StreamEvent::Content(text) => EventPayload::Content(text.clone()),
            StreamEvent::Error(message) => EventPayload::Error(message.clone()),
        };
        // A map of strings cannot fail to serialize
        serde_json::to_string(&payload).unwrap_or_default()
    }

    /// Full wire frame including the blank separator line
    pub fn to_wire(&self) -> String {
        format!("{}{}\n\n", EVENT_PREFIX, self.to_data())
    }

    /// Parse the text after the `data: ` prefix
    pub fn parse_data(data: &str) -> Result<Self, serde_json::Error> {
        let data = data.trim();
        if data == DONE_SENTINEL {
            return Ok(StreamEvent::Done);
        }
        let payload: EventPayload = serde_json::from_str(data)?;
        Ok(match payload {
            EventPayload::Reasoning(text) => StreamEvent::Reasoning(text),
            EventPayload::Content(text) => StreamEvent::Content(text),
            EventPayload::Error(message) => StreamEvent::Error(message),
        })
    }
}
