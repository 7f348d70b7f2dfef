use std::collections::VecDeque;

use crate::core::message::Message;

/// Interaction state the renderer reads every frame: the transcript, the
/// compose buffer, scroll position, and whether a reply is in flight.
pub struct UiState {
    pub messages: VecDeque<Message>,
    pub input: String,
    pub current_response: String,
    pub is_streaming: bool,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub exit_requested: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
            input: String::new(),
            current_response: String::new(),
            is_streaming: false,
            scroll_offset: 0,
            auto_scroll: true,
            exit_requested: false,
        }
    }

    pub fn begin_streaming(&mut self) {
        self.is_streaming = true;
    }

    pub fn end_streaming(&mut self) {
        self.is_streaming = false;
    }

    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
