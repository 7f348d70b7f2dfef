//! Main chat event loop.
//!
//! Drives the terminal session: renders frames, dispatches key and mouse
//! events, and applies streamed fragments as they arrive from the
//! exchange channel.

use std::{error::Error, io, time::Duration};

use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{
            self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent,
            KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
        },
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    Terminal,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::app::{prepare_session, App};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::message::Message;
use crate::ui::renderer::{calculate_max_scroll_offset, ui};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Quit,
}

pub async fn run_chat(model: Option<String>, no_stream: bool) -> Result<(), Box<dyn Error>> {
    let session = prepare_session(model, no_stream)?;
    let mut app = App::new(session);
    debug!(model = %app.session.client.model(), "starting chat session");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (service, mut rx) = ChatStreamService::new();
    let result = run_event_loop(&mut terminal, &mut app, &service, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    service: &ChatStreamService,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let viewport = transcript_height(terminal.size()?.height);

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, service, key, viewport) == LoopControl::Quit {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse, viewport),
                _ => {}
            }
        }

        let mut received_any = false;
        while let Ok((message, stream_id)) = rx.try_recv() {
            apply_stream_message(app, message, stream_id);
            received_any = true;
        }
        if received_any {
            autoscroll(app, viewport);
        }
    }
}

/// Rows left for the transcript once the title, stats line, and input box
/// have taken theirs.
fn transcript_height(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(4).saturating_sub(1)
}

fn autoscroll(app: &mut App, available_height: u16) {
    if app.ui.auto_scroll {
        app.ui.scroll_offset = calculate_max_scroll_offset(app, available_height);
    }
}

fn handle_key(
    app: &mut App,
    service: &ChatStreamService,
    key: KeyEvent,
    viewport: u16,
) -> LoopControl {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.conversation().cancel_in_flight();
            return LoopControl::Quit;
        }
        KeyCode::Char('t') if ctrl => {
            app.session.toggle_streaming();
        }
        KeyCode::Char('r') if ctrl => {
            app.conversation().reset();
        }
        KeyCode::Up if ctrl => {
            app.session.widen_history();
        }
        KeyCode::Down if ctrl => {
            app.session.narrow_history();
        }
        KeyCode::Esc => {
            if app.ui.is_streaming {
                app.conversation().cancel_in_flight();
                app.conversation()
                    .abort_exchange(Message::app_info("Reply cancelled."));
            }
        }
        KeyCode::Enter => {
            submit_input(app, service);
            autoscroll(app, viewport);
        }
        KeyCode::Char(c) if !ctrl => {
            app.ui.input.push(c);
        }
        KeyCode::Backspace => {
            app.ui.input.pop();
        }
        KeyCode::Up => scroll_up(app, 1),
        KeyCode::Down => scroll_down(app, 1, viewport),
        KeyCode::PageUp => scroll_up(app, viewport.max(1)),
        KeyCode::PageDown => scroll_down(app, viewport.max(1), viewport),
        _ => {}
    }
    LoopControl::Continue
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, viewport: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => scroll_up(app, 3),
        MouseEventKind::ScrollDown => scroll_down(app, 3, viewport),
        _ => {}
    }
}

fn scroll_up(app: &mut App, lines: u16) {
    app.ui.auto_scroll = false;
    app.ui.scroll_offset = app.ui.scroll_offset.saturating_sub(lines);
}

fn scroll_down(app: &mut App, lines: u16, viewport: u16) {
    let max_offset = calculate_max_scroll_offset(app, viewport);
    app.ui.scroll_offset = app.ui.scroll_offset.saturating_add(lines).min(max_offset);
    // Back at the bottom: resume following the reply.
    if app.ui.scroll_offset >= max_offset {
        app.ui.auto_scroll = true;
    }
}

/// One user action runs one exchange to completion; input submitted while
/// a reply is in flight is left in the compose box.
fn submit_input(app: &mut App, service: &ChatStreamService) {
    if app.ui.is_streaming {
        return;
    }
    let text = app.ui.input.trim().to_string();
    if text.is_empty() {
        return;
    }
    app.ui.take_input();

    let history = app.conversation().add_user_message(text.clone());
    let (cancel_token, stream_id) = app.conversation().begin_exchange();
    app.ui.auto_scroll = true;

    service.spawn_exchange(StreamParams {
        client: app.session.client.clone(),
        history,
        message: text,
        streaming: app.session.streaming_enabled,
        cancel_token,
        stream_id,
    });
}

/// Route one channel event into the conversation. Events from a
/// superseded or already-settled exchange are dropped.
fn apply_stream_message(app: &mut App, message: StreamMessage, stream_id: u64) {
    if stream_id != app.session.current_stream_id || !app.ui.is_streaming {
        return;
    }
    match message {
        StreamMessage::Chunk(fragment) => app.conversation().append_to_response(&fragment),
        StreamMessage::Blocked { reason } => {
            app.conversation()
                .abort_exchange(Message::app_warning(blocked_notice(reason.as_deref())));
        }
        StreamMessage::Error(detail) => {
            app.conversation().abort_exchange(Message::app_error(detail));
        }
        StreamMessage::End => {
            let _ = app.conversation().finalize_response();
        }
    }
}

fn blocked_notice(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!(
            "Your message was blocked by the safety filter ({reason}). \
             Try rephrasing it and sending again."
        ),
        None => "Your message was blocked by the safety filter. \
                 Try rephrasing it and sending again."
            .to_string(),
    }
}
