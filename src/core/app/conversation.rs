use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::session::SessionContext;
use super::ui_state::UiState;
use crate::api::Content;
use crate::core::history::history_window;
use crate::core::message::Message;

/// Mutating operations over one conversation turn. Borrows the session
/// and UI state so every transition that touches both stays in one place.
pub struct ConversationController<'a> {
    session: &'a mut SessionContext,
    ui: &'a mut UiState,
}

impl<'a> ConversationController<'a> {
    pub fn new(session: &'a mut SessionContext, ui: &'a mut UiState) -> Self {
        Self { session, ui }
    }

    /// Append the user's message plus an empty assistant placeholder and
    /// return the bounded history that seeds the exchange. The history is
    /// captured before the append, so the pending turn is excluded.
    pub fn add_user_message(&mut self, content: String) -> Vec<Content> {
        let history = history_window(&self.ui.messages, self.session.history_window);

        self.ui.messages.push_back(Message::user(content));
        self.ui.messages.push_back(Message::assistant(String::new()));
        self.ui.current_response.clear();

        history
    }

    /// Fragments apply in emission order: each one extends both the
    /// accumulator and the placeholder the renderer is showing.
    pub fn append_to_response(&mut self, fragment: &str) {
        self.ui.current_response.push_str(fragment);
        if let Some(last) = self.ui.messages.back_mut() {
            if last.is_assistant() {
                last.content.push_str(fragment);
            }
        }
    }

    /// Commit the accumulated reply as the assistant's message. A reply
    /// that produced no text at all is treated as a failure so the
    /// transcript never keeps a dangling user turn.
    pub fn finalize_response(&mut self) -> bool {
        if self.ui.current_response.is_empty() {
            self.abort_exchange(Message::app_error(
                "The reply ended without any text. Please try again.",
            ));
            return false;
        }

        debug!(chars = self.ui.current_response.len(), "reply committed");
        self.session.stream_cancel_token = None;
        self.ui.current_response.clear();
        self.ui.end_streaming();
        true
    }

    /// Failure path shared by blocked prompts, transport faults, and
    /// cancellation: drop the pending turn, surface a banner, and leave
    /// the session ready for the next input.
    pub fn abort_exchange(&mut self, banner: Message) {
        self.rollback_pending();
        self.ui.messages.push_back(banner);
        self.session.stream_cancel_token = None;
        self.ui.end_streaming();
    }

    /// Remove the assistant placeholder (with any partial fragments) and
    /// the user message it was answering.
    fn rollback_pending(&mut self) {
        if self.ui.messages.back().is_some_and(Message::is_assistant) {
            self.ui.messages.pop_back();
        }
        if self.ui.messages.back().is_some_and(Message::is_user) {
            self.ui.messages.pop_back();
        }
        self.ui.current_response.clear();
    }

    /// Supersede any live exchange and hand out the cancellation token
    /// and id for the new one.
    pub fn begin_exchange(&mut self) -> (CancellationToken, u64) {
        self.cancel_in_flight();

        self.session.current_stream_id += 1;
        let token = CancellationToken::new();
        self.session.stream_cancel_token = Some(token.clone());
        self.ui.begin_streaming();

        (token, self.session.current_stream_id)
    }

    pub fn cancel_in_flight(&mut self) {
        if let Some(token) = &self.session.stream_cancel_token {
            token.cancel();
        }
        self.session.stream_cancel_token = None;
    }

    /// Clear the transcript and restart the session clock. Both happen
    /// before the next frame renders.
    pub fn reset(&mut self) {
        self.cancel_in_flight();
        self.ui.messages.clear();
        self.ui.current_response.clear();
        self.ui.end_streaming();
        self.ui.scroll_offset = 0;
        self.ui.auto_scroll = true;
        self.session.started_at = Local::now();
    }
}
