use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::app::{App, SessionStats};
use crate::core::constants::STREAMING_CURSOR;
use crate::core::message::TranscriptRole;

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let lines = build_display_lines(app);

    // Account for the title row, then clamp the requested scroll offset.
    let available_height = chunks[0].height.saturating_sub(1);
    let total_lines = lines.len() as u16;
    let max_offset = total_lines.saturating_sub(available_height);
    let scroll_offset = app.ui.scroll_offset.min(max_offset);

    let transcript = Paragraph::new(lines)
        .block(Block::default().title("Kombot"))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(transcript, chunks[0]);

    let stats = Paragraph::new(format_stats_line(
        &app.stats(),
        app.session.streaming_enabled,
        app.session.history_window,
    ))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(stats, chunks[1]);

    let input_title = if app.ui.is_streaming {
        "Waiting for the reply (Esc to cancel)"
    } else {
        "Type your message (Enter to send, Ctrl+C to quit)"
    };
    let input = Paragraph::new(app.ui.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(input_title))
        .wrap(Wrap { trim: true });
    f.render_widget(input, chunks[2]);

    if !app.ui.is_streaming {
        f.set_cursor_position((
            chunks[2].x + app.ui.input.width() as u16 + 1,
            chunks[2].y + 1,
        ));
    }
}

pub(crate) fn build_display_lines(app: &App) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    if app.ui.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Hi! I'm Kombot. Ask your first question to get started.",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    let last_index = app.ui.messages.len() - 1;
    for (index, msg) in app.ui.messages.iter().enumerate() {
        match msg.role {
            TranscriptRole::User => {
                lines.push(Line::from(vec![
                    Span::styled(
                        "You: ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(&msg.content, Style::default().fg(Color::Cyan)),
                ]));
                lines.push(Line::from(""));
            }
            TranscriptRole::Assistant => {
                let cursor = app.ui.is_streaming && index == last_index;
                push_assistant_lines(&mut lines, &msg.content, cursor);
                lines.push(Line::from(""));
            }
            TranscriptRole::AppInfo => {
                push_banner_lines(&mut lines, &msg.content, Color::DarkGray);
            }
            TranscriptRole::AppWarning => {
                push_banner_lines(&mut lines, &msg.content, Color::Yellow);
            }
            TranscriptRole::AppError => {
                push_banner_lines(&mut lines, &msg.content, Color::Red);
            }
        }
    }

    lines
}

fn push_assistant_lines<'a>(lines: &mut Vec<Line<'a>>, content: &'a str, cursor: bool) {
    let cursor_span =
        || Span::styled(STREAMING_CURSOR, Style::default().add_modifier(Modifier::BOLD));

    if content.is_empty() {
        if cursor {
            lines.push(Line::from(cursor_span()));
        }
        return;
    }

    let content_lines: Vec<&str> = content.lines().collect();
    let last = content_lines.len().saturating_sub(1);
    for (i, content_line) in content_lines.iter().enumerate() {
        let mut spans = vec![Span::styled(
            *content_line,
            Style::default().fg(Color::White),
        )];
        if cursor && i == last {
            spans.push(cursor_span());
        }
        lines.push(Line::from(spans));
    }
}

fn push_banner_lines<'a>(lines: &mut Vec<Line<'a>>, content: &'a str, color: Color) {
    for content_line in content.lines() {
        lines.push(Line::from(Span::styled(
            content_line,
            Style::default().fg(color),
        )));
    }
    lines.push(Line::from(""));
}

pub(crate) fn format_stats_line(stats: &SessionStats, streaming: bool, window: usize) -> String {
    format!(
        " {} messages · you {} · bot {} · ~{} tokens · {} min · streaming {} · context {}",
        stats.total,
        stats.from_user,
        stats.from_assistant,
        stats.token_estimate,
        stats.minutes,
        if streaming { "on" } else { "off" },
        window,
    )
}

pub(crate) fn calculate_max_scroll_offset(app: &App, available_height: u16) -> u16 {
    let total_lines = build_display_lines(app).len() as u16;
    total_lines.saturating_sub(available_height)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::app::SessionContext;
    use crate::core::client::ChatClient;
    use crate::core::config::Config;
    use crate::core::message::Message;

    fn test_app() -> App {
        let client = Arc::new(
            ChatClient::new(
                "test-key".to_string(),
                "https://example.invalid/v1beta".to_string(),
                "test-model".to_string(),
                None,
            )
            .expect("build client"),
        );
        App::new(SessionContext::new(client, &Config::default()))
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn rendered_text(app: &App) -> Vec<String> {
        build_display_lines(app).iter().map(line_text).collect()
    }

    #[test]
    fn empty_transcript_shows_the_welcome_line() {
        let app = test_app();
        let lines = rendered_text(&app);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Ask your first question"));
    }

    #[test]
    fn streaming_reply_carries_the_cursor_until_committed() {
        let mut app = test_app();
        let _ = app.conversation().add_user_message("hello".to_string());
        app.conversation().begin_exchange();

        let mut seen = Vec::new();
        for fragment in ["Hi", " there", "!"] {
            app.conversation().append_to_response(fragment);
            let lines = rendered_text(&app);
            seen.push(lines.iter().rev().find(|l| !l.is_empty()).unwrap().clone());
        }
        assert_eq!(
            seen,
            vec![
                format!("Hi{STREAMING_CURSOR}"),
                format!("Hi there{STREAMING_CURSOR}"),
                format!("Hi there!{STREAMING_CURSOR}"),
            ]
        );

        assert!(app.conversation().finalize_response());
        let lines = rendered_text(&app);
        assert!(lines.iter().any(|l| l == "Hi there!"));
        assert!(!lines.iter().any(|l| l.contains(STREAMING_CURSOR)));
    }

    #[test]
    fn pending_reply_with_no_text_renders_only_the_cursor() {
        let mut app = test_app();
        let _ = app.conversation().add_user_message("hello".to_string());
        app.conversation().begin_exchange();

        let lines = rendered_text(&app);
        assert!(lines.iter().any(|l| l == STREAMING_CURSOR));
    }

    #[test]
    fn banners_are_rendered_line_by_line() {
        let mut app = test_app();
        app.ui
            .messages
            .push_back(Message::app_error("API Error: boom\n```\ndetail\n```"));

        let lines = rendered_text(&app);
        assert!(lines.iter().any(|l| l == "API Error: boom"));
        assert!(lines.iter().any(|l| l == "detail"));
    }

    #[test]
    fn user_messages_carry_the_you_prefix() {
        let mut app = test_app();
        app.ui.messages.push_back(Message::user("how far is it?"));

        let lines = rendered_text(&app);
        assert_eq!(lines[0], "You: how far is it?");
    }

    #[test]
    fn stats_line_reports_counts_and_settings() {
        let mut app = test_app();
        let _ = app.conversation().add_user_message("hellohello".to_string());
        app.conversation().append_to_response("hi");
        let _ = app.conversation().finalize_response();

        let line = format_stats_line(&app.stats(), true, 50);
        assert!(line.contains("2 messages"));
        assert!(line.contains("you 1"));
        assert!(line.contains("bot 1"));
        assert!(line.contains("~3 tokens"));
        assert!(line.contains("streaming on"));
        assert!(line.contains("context 50"));
    }

    #[test]
    fn max_scroll_offset_accounts_for_viewport_height() {
        let mut app = test_app();
        for i in 0..10 {
            app.ui.messages.push_back(Message::user(format!("m{i}")));
        }

        // 10 user messages render as 20 lines (content + spacing).
        assert_eq!(calculate_max_scroll_offset(&app, 5), 15);
        assert_eq!(calculate_max_scroll_offset(&app, 50), 0);
    }
}
