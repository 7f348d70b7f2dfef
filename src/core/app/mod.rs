pub mod conversation;
pub mod session;
pub mod ui_state;

pub use conversation::ConversationController;
pub use session::{prepare_session, session_stats, SessionContext, SessionStats};
pub use ui_state::UiState;

/// Session plus interaction state for one interactive chat. Handlers
/// receive this explicitly; there is no ambient global state.
pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            ui: UiState::new(),
        }
    }

    /// Returns a controller for conversation operations: submitting a
    /// turn, applying streamed fragments, rollback, and reset.
    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(&mut self.session, &mut self.ui)
    }

    pub fn stats(&self) -> SessionStats {
        session_stats(&self.ui.messages, self.session.started_at)
    }
}
