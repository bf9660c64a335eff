//! Stream relay: upstream deltas to tagged events
//!
//! Rules:
//! - reasoning fragment → `reasoning` event; otherwise content → `content`
//! - a delta carrying neither is skipped
//! - upstream exhausted → `Done`, then the stream ends
//! - upstream error → one `Error`, then the stream ends; the full error
//!   goes to the log, the event carries `client_message`
//!
//! The relay pulls upstream only when the consumer polls it. When the client
//! goes away the response body is dropped, and with it the upstream stream.

use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, error};

use crate::core::upstream::{ChatDelta, DeltaStream};
use crate::types::StreamEvent;

/// Event for one delta, if it carries any text.
/// Reasoning wins when a delta carries both.
pub fn classify(delta: ChatDelta) -> Option<StreamEvent> {
    match delta {
        ChatDelta { reasoning: Some(text), .. } if !text.is_empty() => Some(StreamEvent::Reasoning(text)),
        ChatDelta { content: Some(text), .. } if !text.is_empty() => Some(StreamEvent::Content(text)),
        _ => None,
    }
}

/// Relay an upstream stream as events, in upstream order.
///
/// Always ends with exactly one terminal event.
pub fn relay(upstream: DeltaStream) -> impl Stream<Item = StreamEvent> + Send + 'static {
    stream::unfold(Some(upstream), |state| async move {
        let mut upstream = state?;
        loop {
            match upstream.next().await {
                Some(Ok(delta)) => {
                    if let Some(event) = classify(delta) {
                        return Some((event, Some(upstream)));
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "upstream failed mid-stream");
                    return Some((StreamEvent::Error(e.client_message()), None));
                }
                None => {
                    debug!("upstream exhausted");
                    return Some((StreamEvent::Done, None));
                }
            }
        }
    })
}
