use std::collections::VecDeque;

use crate::api::Content;
use crate::core::message::Message;

/// Translate the transcript into the history that seeds a model
/// conversation: the last `window` conversational messages, oldest first,
/// with roles mapped into the API vocabulary (`assistant` becomes
/// `model`). App-authored banners never enter the window.
///
/// Pure and total; an empty transcript yields an empty history.
pub fn history_window(messages: &VecDeque<Message>, window: usize) -> Vec<Content> {
    let conversational: Vec<&Message> = messages
        .iter()
        .filter(|msg| msg.role.is_conversational())
        .collect();

    let start = conversational.len().saturating_sub(window);
    conversational[start..]
        .iter()
        .filter_map(|msg| {
            msg.role
                .api_role()
                .map(|role| Content::new(role, msg.content.clone()))
        })
        .collect()
}
