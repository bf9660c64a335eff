//! Integration tests for the stream relay
//!
//! Upstream script → relay → wire bytes → client decoder

mod common;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use std::convert::Infallible;

use common::{abcd_script, ScriptedProvider};
use divination::core::{relay, ChatDelta, CompletionProvider, ReadingContext, ReadingSession};
use divination::error::{ReadingError, UpstreamError};
use divination::types::StreamEvent;

async fn relay_wire(provider: &ScriptedProvider) -> String {
    let upstream = provider.open_stream("system", "prompt").await.unwrap();
    relay(upstream).map(|event| event.to_wire()).collect::<Vec<_>>().await.concat()
}

fn body(wire: &str, chunk: usize) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> + Unpin {
    let parts: Vec<Result<Bytes, Infallible>> = wire
        .as_bytes()
        .chunks(chunk)
        .map(|part| Ok(Bytes::copy_from_slice(part)))
        .collect();
    stream::iter(parts)
}

#[tokio::test]
async fn test_reasoning_then_content_then_done() {
    let provider = ScriptedProvider::new(abcd_script());
    let wire = relay_wire(&provider).await;

    assert_eq!(
        wire,
        "data: {\"type\":\"reasoning\",\"content\":\"A\"}\n\n\
         data: {\"type\":\"reasoning\",\"content\":\"B\"}\n\n\
         data: {\"type\":\"content\",\"content\":\"C\"}\n\n\
         data: {\"type\":\"content\",\"content\":\"D\"}\n\n\
         data: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_client_buffers_survive_any_chunking() {
    let provider = ScriptedProvider::new(abcd_script());
    let wire = relay_wire(&provider).await;

    for chunk in [1, 2, 3, 5, 8, 13, wire.len()] {
        let mut session = ReadingSession::new("q", ReadingContext::Tarot(vec![]));
        let mut order = Vec::new();
        session
            .consume(body(&wire, chunk), |event| order.push(event.clone()))
            .await
            .unwrap();

        assert_eq!(session.reasoning(), "AB", "chunk size {}", chunk);
        assert_eq!(session.answer(), "CD", "chunk size {}", chunk);
        assert_eq!(order.last(), Some(&StreamEvent::Done));
    }
}

#[tokio::test]
async fn test_fault_after_one_content_yields_one_error() {
    let provider = ScriptedProvider::new(vec![
        Ok(ChatDelta::content("卦")),
        Err(UpstreamError::Transport("connection reset".into())),
    ]);
    let upstream = provider.open_stream("system", "prompt").await.unwrap();
    let events: Vec<StreamEvent> = relay(upstream).collect().await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], StreamEvent::Content("卦".into()));
    assert!(matches!(events[1], StreamEvent::Error(_)));
    assert!(!events.contains(&StreamEvent::Done));

    let wire: String = events.iter().map(StreamEvent::to_wire).collect();
    let mut session = ReadingSession::new("q", ReadingContext::Tarot(vec![]));
    let result = session.consume(body(&wire, 4), |_| {}).await;
    assert!(matches!(result, Err(ReadingError::Upstream(ref m)) if m.contains("connection reset")));
    assert_eq!(session.answer(), "卦");
}

#[tokio::test]
async fn test_in_band_error_object_from_provider() {
    let provider = ScriptedProvider::new(vec![
        Ok(ChatDelta::reasoning("r")),
        Err(UpstreamError::Api("rate limited".into())),
    ]);
    let wire = relay_wire(&provider).await;
    assert!(wire.ends_with("\"}\n\n"));
    assert!(wire.contains("\"type\":\"error\""));
    assert!(wire.contains("rate limited"));
}
