use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use crate::core::client::ChatClient;
use crate::core::config::Config;
use crate::core::constants::{
    CHARS_PER_TOKEN, HISTORY_WINDOW_MAX, HISTORY_WINDOW_MIN, HISTORY_WINDOW_STEP,
};
use crate::core::message::Message;

/// Per-session state: the shared client handle, session metadata, the
/// runtime-adjustable settings, and bookkeeping for the in-flight
/// exchange. One of these exists per interactive session.
pub struct SessionContext {
    pub client: Arc<ChatClient>,
    pub started_at: DateTime<Local>,
    pub streaming_enabled: bool,
    pub history_window: usize,
    pub stream_cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
}

impl SessionContext {
    pub fn new(client: Arc<ChatClient>, config: &Config) -> Self {
        Self {
            client,
            started_at: Local::now(),
            streaming_enabled: config.streaming,
            history_window: config.history_window,
            stream_cancel_token: None,
            current_stream_id: 0,
        }
    }

    pub fn toggle_streaming(&mut self) -> bool {
        self.streaming_enabled = !self.streaming_enabled;
        self.streaming_enabled
    }

    pub fn widen_history(&mut self) -> usize {
        self.history_window = (self.history_window + HISTORY_WINDOW_STEP).min(HISTORY_WINDOW_MAX);
        self.history_window
    }

    pub fn narrow_history(&mut self) -> usize {
        self.history_window = self
            .history_window
            .saturating_sub(HISTORY_WINDOW_STEP)
            .max(HISTORY_WINDOW_MIN);
        self.history_window
    }
}

/// Build the session from the startup configuration. This is the only
/// place a [`ChatClient`] is constructed; everything downstream borrows
/// the shared handle.
pub fn prepare_session(
    model_override: Option<String>,
    no_stream: bool,
) -> Result<SessionContext, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let api_key = config.resolve_api_key()?;
    let base_url = config.resolve_base_url();
    let model = model_override.unwrap_or_else(|| config.model.clone());

    let client = Arc::new(ChatClient::new(
        api_key,
        base_url,
        model,
        config.system_instruction.clone(),
    )?);

    let mut session = SessionContext::new(client, &config);
    if no_stream {
        session.streaming_enabled = false;
    }
    Ok(session)
}

/// Numeric session statistics rendered every frame. The token figure is a
/// display-only approximation, not a billing-accurate count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub from_user: usize,
    pub from_assistant: usize,
    pub token_estimate: usize,
    pub minutes: i64,
}

pub fn session_stats(messages: &VecDeque<Message>, started_at: DateTime<Local>) -> SessionStats {
    session_stats_at(messages, started_at, Local::now())
}

pub fn session_stats_at(
    messages: &VecDeque<Message>,
    started_at: DateTime<Local>,
    now: DateTime<Local>,
) -> SessionStats {
    let from_user = messages.iter().filter(|msg| msg.is_user()).count();
    let from_assistant = messages.iter().filter(|msg| msg.is_assistant()).count();
    let total_chars: usize = messages
        .iter()
        .filter(|msg| msg.role.is_conversational())
        .map(|msg| msg.content.chars().count())
        .sum();

    SessionStats {
        total: from_user + from_assistant,
        from_user,
        from_assistant,
        token_estimate: total_chars / CHARS_PER_TOKEN,
        minutes: (now - started_at).num_minutes(),
    }
}
