//! Divination: tarot and I Ching readings streamed from a language model
//!
//! The client casts a hexagram (or draws tarot cards) locally, posts it to the
//! server, and the server relays the model's reasoning and answer back as a
//! stream of tagged events.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// HEXAGRAM CASTING
// =============================================================================

/// Value contributed by a coin landing tails
pub const COIN_TAILS: u8 = 2;

/// Value contributed by a coin landing heads
pub const COIN_HEADS: u8 = 3;

/// Coins tossed per line
pub const COINS_PER_LINE: usize = 3;

/// Lines in a complete hexagram
pub const LINES_PER_HEXAGRAM: usize = 6;

/// Fallback name for a sequence missing from the 64-entry table.
/// Never expected in practice; a hit means the table is wrong.
pub const UNKNOWN_HEXAGRAM: &str = "未知卦象";

// =============================================================================
// STREAM WIRE FORMAT
// =============================================================================

/// Prefix of every event line on the wire
pub const EVENT_PREFIX: &str = "data: ";

/// Terminal sentinel payload
pub const DONE_SENTINEL: &str = "[DONE]";

// =============================================================================
// UPSTREAM DEFAULTS
// =============================================================================

/// Default OpenAI-compatible endpoint
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.openai.com/v1";

/// Attempts after the first when opening the upstream stream
pub const DEFAULT_UPSTREAM_MAX_RETRIES: u32 = 3;

/// Budget for establishing the upstream stream (milliseconds)
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// ANALYTICS KEYS
// =============================================================================

/// Counter of tarot readings served
pub const TAROT_CALLS_KEY: &str = "tarot_calls";

/// Counter of I Ching readings served
pub const ICHING_CALLS_KEY: &str = "iching_calls";

/// Frontend routes that count as a page view
pub const TRACKED_ROUTES: [&str; 4] = ["/", "/tarot", "/iching", "/stats"];

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
