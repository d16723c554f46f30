//! Provider trait — the abstraction over the hosted model API.
//!
//! A Provider knows how to submit a conversation (plus the available tool
//! descriptors) and get back either a final text reply or a set of
//! requested tool invocations. The relay loop calls `complete()` without
//! knowing which backend is behind it, so tests substitute mocks freely.

use crate::conversation::Turn;
use crate::error::ProviderError;
use crate::tool::ToolDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single completion request: the whole turn log plus tool descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Static system instruction (the bot persona).
    pub system_instruction: String,

    /// The conversation so far, oldest first.
    pub turns: Vec<Turn>,

    /// Tools the model may request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The model's reply for one round: free text, zero or more tool requests,
/// or both. An empty `tool_calls` list means this is the final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    /// Natural-language content (may be empty when only tools were
    /// requested).
    pub text: String,

    /// Requested tool invocations, in the order the model emitted them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelReply {
    /// A plain text reply with no tool requests.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Whether this reply terminates the relay loop.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Submit the conversation and get the model's reply for this round.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ModelReply, ProviderError>;
}
