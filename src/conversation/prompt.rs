//! Completion request building
//!
//! Turns a stored conversation plus the user's new message into the chat
//! completion payload sent to the model, and unwraps the model's JSON
//! answer back into markdown.

use serde::{Deserialize, Serialize};

use super::storage::{MessageChain, MessageSide, StoredMessage};
use crate::config::GptConfig;
use crate::error::{Error, Result};

/// How many past turns (including the new request) are sent to the model.
pub const MAX_CONVERSATION_DEPTH: usize = 5;

/// Trailing instruction that makes the model answer with a JSON object.
const OUTPUT_FORMAT_INSTRUCTION: &str = "Output format: JSON object with one string field: 'output_markdown'. 'output_markdown' is the response text in Markdown format.";

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Author of a chat completion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

/// A chat completion request body. Unset model parameters are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    pub response_format: ResponseFormat,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Build a request from the configuration and the conversation so far.
    ///
    /// Only the last [`MAX_CONVERSATION_DEPTH`] turns of `history` are kept.
    pub fn build(config: &GptConfig, history: &[StoredMessage]) -> Self {
        let model = &config.model;
        let recent = &history[history.len().saturating_sub(MAX_CONVERSATION_DEPTH)..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::new(Role::System, config.prompt.as_str()));
        messages.extend(recent.iter().map(|message| {
            let role = match message.side {
                MessageSide::User => Role::User,
                MessageSide::Bot => Role::Assistant,
            };
            ChatMessage::new(role, message.text.as_str())
        }));
        messages.push(ChatMessage::new(Role::System, OUTPUT_FORMAT_INSTRUCTION));

        Self {
            model: model.name.clone(),
            max_completion_tokens: model.max_completion_tokens,
            temperature: model.temperature,
            top_p: model.top_p,
            n: model.n,
            presence_penalty: model.presence_penalty,
            seed: model.seed,
            frequency_penalty: model.frequency_penalty,
            service_tier: model.service_tier.clone(),
            verbosity: model.verbosity.clone(),
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
            messages,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────────────────────────

/// Trim a request and make sure it ends with a period. Empty text gives `None`.
pub fn normalize_request(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.ends_with('.') {
        Some(text.to_string())
    } else {
        Some(format!("{}.", text))
    }
}

/// The stored conversation that `reply_to` belongs to, followed by the new
/// request as a user turn.
pub fn collect_history(
    chain: &MessageChain<'_>,
    reply_to: Option<i32>,
    text: &str,
) -> Result<Vec<StoredMessage>> {
    let request = normalize_request(text).ok_or(Error::EmptyText)?;

    let mut history = reply_to.map(|id| chain.read(id)).unwrap_or_default();
    history.push(StoredMessage {
        side: MessageSide::User,
        text: request,
    });
    Ok(history)
}

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CompletionOutput {
    output_markdown: String,
}

/// Extract the markdown answer from the model's reply content.
///
/// The model is asked for `{"output_markdown": "..."}`; anything else is
/// taken to be the answer itself.
pub fn parse_completion_output(content: &str) -> String {
    match serde_json::from_str::<CompletionOutput>(content) {
        Ok(output) => output.output_markdown,
        Err(_) => content.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
