use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::api::{ChatRequest, ChatResponse, Content, SystemInstruction, API_ROLE_USER};
use crate::core::constants::REQUEST_TIMEOUT_SECS;
use crate::utils::url::construct_api_url;

/// Outcome of a single conversational exchange. Callers must handle every
/// variant; there is no catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Completed(String),
    Blocked { reason: Option<String> },
    Failed { detail: String },
}

/// Handle to the remote model. Built exactly once at process start from
/// the resolved configuration and shared read-only for the session's
/// lifetime; construction performs no network I/O.
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_instruction: Option<String>,
}

impl ChatClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        system_instruction: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
            system_instruction,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn generate_url(&self) -> String {
        construct_api_url(
            &self.base_url,
            &format!("models/{}:generateContent", self.model),
        )
    }

    pub(crate) fn stream_url(&self) -> String {
        let url = construct_api_url(
            &self.base_url,
            &format!("models/{}:streamGenerateContent", self.model),
        );
        format!("{url}?alt=sse")
    }

    /// Seed the exchange with the bounded history and append the pending
    /// user text as the newest turn.
    pub(crate) fn request_body(&self, history: Vec<Content>, message: &str) -> ChatRequest {
        let mut contents = history;
        contents.push(Content::new(API_ROLE_USER, message));
        ChatRequest {
            contents,
            system_instruction: self
                .system_instruction
                .as_deref()
                .map(SystemInstruction::new),
        }
    }

    /// Batch mode: one blocking call, one complete reply.
    pub async fn generate(&self, history: Vec<Content>, message: &str) -> ChatOutcome {
        let request = self.request_body(history, message);
        debug!(model = %self.model, turns = request.contents.len(), "sending generateContent request");

        let response = match self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return ChatOutcome::Failed {
                    detail: e.to_string(),
                }
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return ChatOutcome::Failed {
                detail: format!("HTTP {status}: {body}"),
            };
        }

        match response.json::<ChatResponse>().await {
            Ok(parsed) => classify_response(&parsed),
            Err(e) => ChatOutcome::Failed {
                detail: format!("failed to decode response: {e}"),
            },
        }
    }
}

/// Map a parsed response onto the closed outcome set.
pub(crate) fn classify_response(response: &ChatResponse) -> ChatOutcome {
    if let Some(error) = &response.error {
        return ChatOutcome::Failed {
            detail: error.message.clone(),
        };
    }
    if let Some(reason) = response.block_reason() {
        return ChatOutcome::Blocked {
            reason: Some(reason.to_string()),
        };
    }
    match response.text_fragment() {
        Some(text) if !text.is_empty() => ChatOutcome::Completed(text),
        _ => ChatOutcome::Failed {
            detail: "response contained no reply text".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(system_instruction: Option<&str>) -> ChatClient {
        ChatClient::new(
            "test-key".to_string(),
            "https://example.invalid/v1beta".to_string(),
            "gemini-2.5-flash".to_string(),
            system_instruction.map(str::to_string),
        )
        .expect("build client")
    }

    #[test]
    fn endpoint_urls_name_the_model() {
        let client = test_client(None);
        assert_eq!(
            client.generate_url(),
            "https://example.invalid/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client.stream_url(),
            "https://example.invalid/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn request_body_appends_pending_message_after_history() {
        let client = test_client(Some("be brief"));
        let history = vec![
            Content::new("user", "hi"),
            Content::new("model", "hello"),
        ];

        let request = client.request_body(history, "how are you?");

        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.contents[2].role, "user");
        assert_eq!(request.contents[2].parts[0].text, "how are you?");
        assert_eq!(
            request.system_instruction.expect("instruction").parts[0].text,
            "be brief"
        );
    }

    #[test]
    fn request_body_without_instruction_omits_it() {
        let client = test_client(None);
        let request = client.request_body(Vec::new(), "hi");
        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents.len(), 1);
    }

    #[test]
    fn classify_detects_blocked_prompts() {
        let payload = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let response: ChatResponse = serde_json::from_str(payload).expect("parse");
        assert_eq!(
            classify_response(&response),
            ChatOutcome::Blocked {
                reason: Some("SAFETY".to_string())
            }
        );
    }

    #[test]
    fn classify_detects_completed_replies() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":"Hi there!"}]},"finishReason":"STOP"}]}"#;
        let response: ChatResponse = serde_json::from_str(payload).expect("parse");
        assert_eq!(
            classify_response(&response),
            ChatOutcome::Completed("Hi there!".to_string())
        );
    }

    #[test]
    fn classify_surfaces_api_errors() {
        let payload = r#"{"error":{"code":429,"message":"quota exceeded"}}"#;
        let response: ChatResponse = serde_json::from_str(payload).expect("parse");
        assert_eq!(
            classify_response(&response),
            ChatOutcome::Failed {
                detail: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn classify_treats_empty_replies_as_failures() {
        let payload = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        let response: ChatResponse = serde_json::from_str(payload).expect("parse");
        assert!(matches!(
            classify_response(&response),
            ChatOutcome::Failed { .. }
        ));
    }
}
