//! Command-line arguments and environment settings

use clap::Parser;
use std::time::Duration;

use crate::core::upstream::UpstreamConfig;
use crate::{DEFAULT_UPSTREAM_BASE_URL, DEFAULT_UPSTREAM_MAX_RETRIES, DEFAULT_UPSTREAM_TIMEOUT_MS, VERSION};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "divination",
    version = VERSION,
    about = "Tarot and I Ching readings streamed from a language model",
    long_about = "Casts hexagrams and draws tarot cards, then streams an AI reading.\n\n\
                  Modes:\n  \
                  --serve   HTTP API server\n  \
                  --cast    Cast a hexagram and ask the server about it\n  \
                  --tarot   Draw tarot cards and ask the server about them\n  \
                  --stats   Show visit and usage counters\n\n\
                  With --cast and no --question, the hexagram is only printed."
)]
pub struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    pub serve: bool,

    /// Cast a hexagram with three coins
    #[arg(short, long)]
    pub cast: bool,

    /// Draw tarot cards
    #[arg(short, long)]
    pub tarot: bool,

    /// Print the server's stats
    #[arg(long)]
    pub stats: bool,

    /// Question for the reading
    #[arg(short, long)]
    pub question: Option<String>,

    /// Number of tarot cards to draw
    #[arg(long, default_value = "3")]
    pub cards: usize,

    /// Seed for casting and drawing (reproducible readings)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long)]
    pub no_color: bool,

    /// Server address to listen on
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: String,

    /// API root used by the client modes
    #[arg(long, env = "SERVER_URL", default_value = "http://127.0.0.1:3000/api")]
    pub server_url: String,

    /// Upstream API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_UPSTREAM_BASE_URL)]
    pub base_url: String,

    /// Upstream model name
    #[arg(long, env = "MODEL")]
    pub model: Option<String>,

    /// Retries when opening the upstream stream
    #[arg(long, env = "UPSTREAM_MAX_RETRIES", default_value_t = DEFAULT_UPSTREAM_MAX_RETRIES)]
    pub max_retries: u32,

    /// Budget for opening the upstream stream, in milliseconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Log level for this crate
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Upstream settings for server mode
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.base_url.clone(),
            model: self.model.clone().unwrap_or_default(),
            max_retries: self.max_retries,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let modes = [self.serve, self.cast, self.tarot, self.stats];
        if modes.iter().filter(|on| **on).count() > 1 {
            return Err("choose one of --serve, --cast, --tarot, --stats".to_string());
        }
        if self.serve {
            if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                return Err("OPENAI_API_KEY is required in server mode".to_string());
            }
            if self.model.as_deref().map_or(true, |m| m.trim().is_empty()) {
                return Err("MODEL is required in server mode".to_string());
            }
            if self.timeout_ms == 0 {
                return Err("UPSTREAM_TIMEOUT_MS must be positive".to_string());
            }
        }
        if self.tarot && self.cards == 0 {
            return Err("--cards must be at least 1".to_string());
        }
        Ok(())
    }
}
