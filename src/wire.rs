//! Wire-level documents for the chat completions endpoint.
//!
//! These types mirror the JSON the service speaks. They stay out of the
//! public API; callers work with [`crate::types`] instead.

use serde::{Deserialize, Serialize};

use crate::types::{Input, Message, ModelSpec};

/// Body of a `POST /chat/completions` call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl ChatRequest {
    /// Assembles the request document. Streaming and non-streaming calls
    /// both go through here so they serialize identically apart from the
    /// `stream` flag.
    pub fn new(
        input: Input,
        system_prompt: Option<&str>,
        spec: &ModelSpec,
        stream: bool,
    ) -> Self {
        ChatRequest {
            model: spec.to_string(),
            messages: input.into_messages(system_prompt),
            stream,
        }
    }
}

/// Non-streaming completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// Assistant text from the first choice, or an empty string when the
    /// response carries no usable content.
    pub fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

/// One streaming chunk, parsed from an SSE `data:` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// Text delta carried by this chunk. `None` for keep-alive chunks and
    /// the final chunk that only reports a finish reason.
    pub fn into_delta(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    pub delta: Delta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

/// Error document the service attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}
