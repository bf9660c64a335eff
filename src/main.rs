//! Divination CLI
//!
//! Usage:
//!   divination --serve                          # HTTP API server
//!   divination --cast                           # Cast and print a hexagram
//!   divination --cast -q "your question"        # Cast and stream a reading
//!   divination --tarot -q "your question"       # Draw cards and stream a reading
//!   divination --stats                          # Visit and usage counters
//!   divination --cast --json                    # JSON output

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use divination::config::Args;
use divination::core::{
    run_server, CastReading, DivinationClient, HexagramEngine, MemoryCounterStore, OpenAiProvider,
    ReadingSession, TarotDeck,
};
use divination::types::{Period, StatsSnapshot, StreamEvent, TarotCard};
use divination::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("divination={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    args.validate().map_err(|e| anyhow!(e))?;
    if args.no_color {
        colored::control::set_override(false);
    }

    if args.serve {
        run_serve(&args).await
    } else if args.tarot {
        run_tarot(&args).await
    } else if args.stats {
        run_stats(&args).await
    } else {
        run_cast(&args).await
    }
}

/// Run the HTTP API
async fn run_serve(args: &Args) -> Result<()> {
    let provider = OpenAiProvider::new(args.upstream_config()).context("invalid upstream settings")?;
    info!(version = VERSION, model = ?args.model, upstream = %args.base_url, "starting server");
    run_server(&args.listen, Arc::new(provider), Arc::new(MemoryCounterStore::new()))
        .await
        .map_err(|e| anyhow!("server failed: {}", e))
}

/// Cast a hexagram, then ask about it when a question was given
async fn run_cast(args: &Args) -> Result<()> {
    let reading = match args.seed {
        Some(seed) => HexagramEngine::seeded(seed).cast_reading(),
        None => HexagramEngine::new().cast_reading(),
    };

    if args.json && args.question.is_none() {
        println!("{}", serde_json::to_string_pretty(&reading)?);
        return Ok(());
    }
    if !args.json {
        print_header("周易占卜");
        print_hexagram(&reading);
    }

    let Some(question) = args.question.as_deref() else {
        return Ok(());
    };
    let client = DivinationClient::new(&args.server_url)?;
    let mut printer = StreamPrinter::new(args.json);
    let session = client
        .iching_divination(question, reading, |event| printer.print(event))
        .await;
    finish_reading(session, args.json)
}

/// Draw tarot cards, then ask about them when a question was given
async fn run_tarot(args: &Args) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let cards = TarotDeck::new().draw(&mut rng, args.cards);

    if args.json && args.question.is_none() {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }
    if !args.json {
        print_header("塔罗占卜");
        print_cards(&cards);
    }

    let Some(question) = args.question.as_deref() else {
        return Ok(());
    };
    let client = DivinationClient::new(&args.server_url)?;
    let mut printer = StreamPrinter::new(args.json);
    let session = client
        .tarot_reading(question, cards, |event| printer.print(event))
        .await;
    finish_reading(session, args.json)
}

/// Print the server's counters
async fn run_stats(args: &Args) -> Result<()> {
    let client = DivinationClient::new(&args.server_url)?;
    let stats = client.fetch_stats().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn finish_reading(session: Result<ReadingSession, divination::error::ReadingError>, json: bool) -> Result<()> {
    let session = session?;
    if json {
        let output = serde_json::json!({
            "question": session.question(),
            "reasoning": session.reasoning(),
            "answer": session.answer(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
    }
    Ok(())
}

/// Writes stream text as it arrives: reasoning dimmed, answer plain
struct StreamPrinter {
    quiet: bool,
    in_reasoning: bool,
    in_answer: bool,
}

impl StreamPrinter {
    fn new(quiet: bool) -> Self {
        Self { quiet, in_reasoning: false, in_answer: false }
    }

    fn print(&mut self, event: &StreamEvent) {
        if self.quiet {
            return;
        }
        let mut stdout = io::stdout();
        let _ = self.write_event(&mut stdout, event);
        let _ = stdout.flush();
    }

    /// An error event only closes the open line; its message is reported
    /// once, by the error `finish_reading` returns
    fn write_event(&mut self, out: &mut impl Write, event: &StreamEvent) -> io::Result<()> {
        match event {
            StreamEvent::Reasoning(text) => {
                if !self.in_reasoning {
                    writeln!(out, "{}", "── 思考 ──".dimmed())?;
                    self.in_reasoning = true;
                }
                write!(out, "{}", text.dimmed())
            }
            StreamEvent::Content(text) => {
                if !self.in_answer {
                    if self.in_reasoning {
                        writeln!(out)?;
                    }
                    writeln!(out, "{}", "── 解读 ──".bold())?;
                    self.in_answer = true;
                }
                write!(out, "{}", text)
            }
            StreamEvent::Error(_) => {
                if self.in_reasoning || self.in_answer {
                    writeln!(out)?;
                }
                Ok(())
            }
            StreamEvent::Done => Ok(()),
        }
    }
}

fn print_header(title: &str) {
    println!("{}", format!("══ {} · divination v{} ══", title, VERSION).bold());
    println!();
}

fn print_hexagram(reading: &CastReading) {
    println!("{} {}", "本卦".bold(), reading.original_name.cyan());
    for line in reading.original.to_string().lines() {
        println!("  {}", line);
    }
    match (&reading.derived, reading.derived_name) {
        (Some(derived), Some(name)) => {
            let positions: Vec<String> = reading.changing_lines.iter().map(ToString::to_string).collect();
            println!();
            println!("{} 第{}爻", "变爻".bold(), positions.join("、").yellow());
            println!("{} {}", "变卦".bold(), name.cyan());
            for line in derived.to_string().lines() {
                println!("  {}", line);
            }
        }
        _ => println!("{}", "无变爻".dimmed()),
    }
    println!();
}

fn print_cards(cards: &[TarotCard]) {
    for (index, card) in cards.iter().enumerate() {
        println!("  {}. {}", index + 1, card.to_string().cyan());
    }
    println!();
}

fn print_stats(stats: &StatsSnapshot) {
    print_header("统计");
    println!("  {:<8} {:>8} {:>8}", "", "PV", "UV");
    for period in Period::ALL {
        let counts = stats.period(period);
        println!("  {:<8} {:>8} {:>8}", period.as_str(), counts.pv, counts.uv);
    }
    println!();
    println!("  {:<14} {}", "tarot calls", stats.tarot_calls.to_string().green());
    println!("  {:<14} {}", "iching calls", stats.iching_calls.to_string().green());
}
