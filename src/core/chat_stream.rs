use std::sync::Arc;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ChatResponse, Content};
use crate::core::client::{ChatClient, ChatOutcome};

/// Events one exchange emits, in order: zero or more `Chunk`s followed by
/// exactly one terminal event. `End` is the success terminal; `Blocked`
/// and `Error` are the failure terminals and imply the turn must be
/// rolled back.
#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Blocked { reason: Option<String> },
    Error(String),
    End,
}

impl StreamMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamMessage::Chunk(_))
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Returns true when the payload terminated the exchange.
fn handle_data_payload(
    payload: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            if response.error.is_some() {
                let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
                return true;
            }
            if let Some(reason) = response.block_reason() {
                let _ = tx.send((
                    StreamMessage::Blocked {
                        reason: Some(reason.to_string()),
                    },
                    stream_id,
                ));
                return true;
            }
            if let Some(text) = response.text_fragment() {
                if !text.is_empty() {
                    let _ = tx.send((StreamMessage::Chunk(text), stream_id));
                }
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            true
        }
    }
}

fn process_sse_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, tx, stream_id))
        .unwrap_or(false)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;
    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Shape an error body for the transcript: a one-line summary when one
/// can be extracted, with the raw payload preserved in a fenced block.
pub(crate) fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            return match extract_error_summary(&json_value) {
                Some(summary) => format!("API Error: {summary}\n```json\n{pretty_json}\n```"),
                None => format!("API Error:\n```json\n{pretty_json}\n```"),
            };
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{trimmed}\n```")
    } else {
        format!("API Error:\n```\n{trimmed}\n```")
    }
}

pub struct StreamParams {
    pub client: Arc<ChatClient>,
    pub history: Vec<Content>,
    pub message: String,
    pub streaming: bool,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

/// Owns the sending half of the exchange channel. One service lives for
/// the whole session; each exchange is a spawned task whose events carry
/// the stream id that was current when it started, so a superseded
/// exchange's stragglers can be ignored.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_exchange(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                history,
                message,
                streaming,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = run_exchange(client, history, message, streaming, &tx, stream_id, &cancel_token) => {}
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn run_exchange(
    client: Arc<ChatClient>,
    history: Vec<Content>,
    message: String,
    streaming: bool,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
    cancel_token: &tokio_util::sync::CancellationToken,
) {
    if !streaming {
        let event = match client.generate(history, &message).await {
            ChatOutcome::Completed(text) => {
                let _ = tx.send((StreamMessage::Chunk(text), stream_id));
                StreamMessage::End
            }
            ChatOutcome::Blocked { reason } => StreamMessage::Blocked { reason },
            ChatOutcome::Failed { detail } => StreamMessage::Error(format_api_error(&detail)),
        };
        let _ = tx.send((event, stream_id));
        return;
    }

    let request = client.request_body(history, &message);
    debug!(model = %client.model(), stream_id, "opening streamGenerateContent exchange");

    match client
        .http()
        .post(client.stream_url())
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", client.api_key())
        .json(&request)
        .send()
        .await
    {
        Ok(response) => {
            if !response.status().is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                let _ = tx.send((StreamMessage::Error(format_api_error(&error_text)), stream_id));
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                if cancel_token.is_cancelled() {
                    return;
                }

                match chunk {
                    Ok(chunk_bytes) => {
                        buffer.extend_from_slice(&chunk_bytes);

                        while let Some(newline_pos) = memchr(b'\n', &buffer) {
                            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                                Ok(s) => s.trim().to_string(),
                                Err(_) => {
                                    buffer.drain(..=newline_pos);
                                    continue;
                                }
                            };

                            buffer.drain(..=newline_pos);
                            if process_sse_line(&line, tx, stream_id) {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send((
                            StreamMessage::Error(format_api_error(&e.to_string())),
                            stream_id,
                        ));
                        return;
                    }
                }
            }

            // The stream has no end-of-data sentinel; exhaustion is the
            // success signal.
            let _ = tx.send((StreamMessage::End, stream_id));
        }
        Err(e) => {
            let _ = tx.send((
                StreamMessage::Error(format_api_error(&e.to_string())),
                stream_id,
            ));
        }
    }
}
