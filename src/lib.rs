//! Kombot is a full-screen terminal chat assistant backed by the Google
//! Gemini API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns configuration, the session transcript and its history
//!   window, the shared client handle, and streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`api`] defines the Gemini request/response payloads used by the
//!   client and the stream service.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which bootstraps the session and hands
//! control to [`ui::chat_loop`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
