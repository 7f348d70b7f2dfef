use serde::{Deserialize, Serialize};

/// Role label the Gemini API expects for user turns.
pub const API_ROLE_USER: &str = "user";
/// Role label the Gemini API expects for assistant turns.
pub const API_ROLE_MODEL: &str = "model";

/// Candidate finish reasons that indicate the safety filter stopped the
/// reply rather than the model completing it.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// System instruction block. Unlike conversation contents it carries no
/// role on the wire.
#[derive(Serialize, Clone, Debug)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
}

/// One `generateContent` response, or one SSE chunk of a
/// `streamGenerateContent` exchange. Both use the same shape.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ChatResponse {
    /// Reason the safety filter rejected the exchange, if it did. Covers
    /// both prompt-level feedback and a candidate that was cut off by the
    /// filter mid-reply.
    pub fn block_reason(&self) -> Option<&str> {
        if let Some(feedback) = &self.prompt_feedback {
            if let Some(reason) = feedback.block_reason.as_deref() {
                return Some(reason);
            }
        }
        self.candidates.iter().find_map(|candidate| {
            candidate
                .finish_reason
                .as_deref()
                .filter(|reason| BLOCKING_FINISH_REASONS.contains(reason))
        })
    }

    /// Concatenated text of the first candidate's parts. `None` when the
    /// response carries no candidate text at all (error bodies, metadata
    /// chunks).
    pub fn text_fragment(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut text = String::new();
        for part in &content.parts {
            if let Some(piece) = &part.text {
                text.push_str(piece);
            }
        }
        Some(text)
    }
}
