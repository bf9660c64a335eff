//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use divination::core::{ChatDelta, CompletionProvider, DeltaStream};
use divination::error::UpstreamError;

/// Provider that replays a fixed script and records what it was asked
pub struct ScriptedProvider {
    script: Vec<Result<ChatDelta, UpstreamError>>,
    open_error: Option<UpstreamError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ChatDelta, UpstreamError>>) -> Self {
        Self {
            script,
            open_error: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose stream can never be opened
    pub fn failing(error: UpstreamError) -> Self {
        Self { open_error: Some(error), ..Self::new(vec![]) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn open_stream(&self, _system: &str, prompt: &str) -> Result<DeltaStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        Ok(stream::iter(self.script.clone()).boxed())
    }
}

/// Reasoning A, B then content C, D
pub fn abcd_script() -> Vec<Result<ChatDelta, UpstreamError>> {
    vec![
        Ok(ChatDelta::reasoning("A")),
        Ok(ChatDelta::reasoning("B")),
        Ok(ChatDelta::content("C")),
        Ok(ChatDelta::content("D")),
    ]
}
