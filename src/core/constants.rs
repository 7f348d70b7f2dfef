//! Shared constants used across the application

/// Model requested when neither the config file nor the CLI names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Endpoint root; `GEMINI_BASE_URL` overrides it.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// How many transcript messages seed the model's context by default.
pub const DEFAULT_HISTORY_WINDOW: usize = 50;
pub const HISTORY_WINDOW_MIN: usize = 10;
pub const HISTORY_WINDOW_MAX: usize = 100;
pub const HISTORY_WINDOW_STEP: usize = 10;

/// Display-only token estimate assumes this many characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Marker appended to a reply while fragments are still arriving.
pub const STREAMING_CURSOR: &str = "▌";

/// Hard cap on a single exchange; a hung remote call must not pin the
/// session forever.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;
