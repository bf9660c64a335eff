//! Core modules for the divination service

pub mod names;
pub mod casting;
pub mod tarot;
pub mod prompt;
pub mod upstream;
pub mod relay;
pub mod decoder;
pub mod counter;
pub mod analytics;
pub mod api;
pub mod client;

pub use names::{lookup, lookup_name, HexagramEntry, HEXAGRAMS};
pub use casting::{CastReading, HexagramEngine};
pub use tarot::TarotDeck;
pub use prompt::Prompt;
pub use upstream::{ChatDelta, CompletionProvider, DeltaStream, OpenAiProvider, UpstreamConfig};
pub use relay::{classify, relay};
pub use decoder::{EventDecoder, Flow, ReadingContext, ReadingSession};
pub use counter::{CounterStore, MemoryCounterStore};
pub use analytics::{bucket_key, is_tracked_route, Analytics};
pub use api::{create_router, run_server, AppState};
pub use client::DivinationClient;
