use serde::{Deserialize, Serialize};

use crate::api::{API_ROLE_MODEL, API_ROLE_USER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TranscriptRole {
    User,
    Assistant,
    AppInfo,
    AppWarning,
    AppError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
            TranscriptRole::AppInfo => "app/info",
            TranscriptRole::AppWarning => "app/warning",
            TranscriptRole::AppError => "app/error",
        }
    }

    /// Role label sent to the remote API, or `None` for app-authored
    /// messages that never leave the transcript.
    pub fn api_role(self) -> Option<&'static str> {
        match self {
            TranscriptRole::User => Some(API_ROLE_USER),
            TranscriptRole::Assistant => Some(API_ROLE_MODEL),
            _ => None,
        }
    }

    /// Inverse of [`api_role`](Self::api_role) for the conversational roles.
    pub fn from_api_role(role: &str) -> Option<Self> {
        match role {
            API_ROLE_USER => Some(TranscriptRole::User),
            API_ROLE_MODEL => Some(TranscriptRole::Assistant),
            _ => None,
        }
    }

    pub fn is_user(self) -> bool {
        self == TranscriptRole::User
    }

    pub fn is_assistant(self) -> bool {
        self == TranscriptRole::Assistant
    }

    /// User and assistant turns make up the conversation; app messages are
    /// banners layered into the display.
    pub fn is_conversational(self) -> bool {
        matches!(self, TranscriptRole::User | TranscriptRole::Assistant)
    }
}

impl AsRef<str> for TranscriptRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for TranscriptRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TranscriptRole::User),
            "assistant" => Ok(TranscriptRole::Assistant),
            "app/info" => Ok(TranscriptRole::AppInfo),
            "app/warning" => Ok(TranscriptRole::AppWarning),
            "app/error" => Ok(TranscriptRole::AppError),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for TranscriptRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranscriptRole> for String {
    fn from(value: TranscriptRole) -> Self {
        value.as_str().to_string()
    }
}

/// Severity for app-authored messages rendered in the transcript but never
/// transmitted to the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMessageKind {
    Info,
    Warning,
    Error,
}

impl AppMessageKind {
    pub fn as_role(self) -> TranscriptRole {
        match self {
            AppMessageKind::Info => TranscriptRole::AppInfo,
            AppMessageKind::Warning => TranscriptRole::AppWarning,
            AppMessageKind::Error => TranscriptRole::AppError,
        }
    }
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Assistant, content)
    }

    pub fn app(kind: AppMessageKind, content: impl Into<String>) -> Self {
        Self::new(kind.as_role(), content)
    }

    pub fn app_info(content: impl Into<String>) -> Self {
        Self::app(AppMessageKind::Info, content)
    }

    pub fn app_warning(content: impl Into<String>) -> Self {
        Self::app(AppMessageKind::Warning, content)
    }

    pub fn app_error(content: impl Into<String>) -> Self {
        Self::app(AppMessageKind::Error, content)
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }
}
