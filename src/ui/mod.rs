//! Terminal UI layer for the interactive chat session.
//!
//! [`chat_loop`] runs the interaction loop and coordinates streaming via
//! [`crate::core::chat_stream`]; [`renderer`] composes each frame.
//!
//! Ownership boundary: this layer presents and captures interaction
//! state, while [`crate::core`] owns domain logic and backend
//! coordination.

pub mod chat_loop;
pub mod renderer;
