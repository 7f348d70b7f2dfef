//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments, wires up diagnostics, and
//! hands control to the interactive chat loop.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "kombot")]
#[command(about = "A terminal chat assistant backed by the Google Gemini API")]
#[command(
    long_about = "Kombot is a full-screen terminal chat assistant backed by the Google Gemini \
API. It keeps a session-scoped transcript, streams replies in real time, and shows live \
session statistics.\n\n\
Configuration:\n\
  Settings are read once at startup from config.toml in the platform config\n\
  directory (model, system instruction, streaming and context defaults).\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    API key (takes precedence over the config file)\n\
  GEMINI_BASE_URL   Custom API base URL (optional)\n\n\
Controls:\n\
  Type / Enter        Compose and send a message\n\
  Esc                 Cancel the in-flight reply\n\
  Up/Down/Mouse       Scroll the transcript\n\
  Ctrl+T              Toggle streaming replies\n\
  Ctrl+Up / Ctrl+Down Grow or shrink the context window\n\
  Ctrl+R              Clear the conversation\n\
  Ctrl+C              Quit"
)]
pub struct Args {
    /// Model to use for chat (overrides the configured default)
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Disable incremental streaming and wait for complete replies
    #[arg(long)]
    pub no_stream: bool,

    /// Append tracing diagnostics to this file
    #[arg(long, value_name = "FILE")]
    pub debug_log: Option<String>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug_log.as_deref())?;
    run_chat(args.model, args.no_stream).await
}

/// Diagnostics go to a file, never to the terminal: the chat loop owns
/// the alternate screen. Without `--debug-log` tracing stays uninstalled.
fn init_tracing(debug_log: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(path) = debug_log else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kombot=debug")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
