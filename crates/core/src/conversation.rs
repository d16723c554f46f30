//! Conversation domain types.
//!
//! A conversation is the per-chat ordered log of turns the relay loop reads
//! and appends to. It lives in memory for the life of the process: `/start`
//! clears it, a restart loses it.

use crate::tool::ToolOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::channel::ChatId;

/// One step in a conversation's history.
///
/// Sequence invariant, maintained by the relay loop as the sole mutator:
/// every `ToolCall` is immediately followed by its matching `ToolResult`
/// before any further `Model` or `User` turn — except when the loop aborts
/// on an unknown tool, in which case the log ends at the offending
/// `ToolCall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// Inbound text from the user.
    User { text: String },

    /// The model's natural-language reply.
    Model { text: String },

    /// The model requested a tool invocation.
    ToolCall {
        name: String,
        arguments: serde_json::Value,
    },

    /// What the tool returned, error payloads included.
    ToolResult { name: String, output: ToolOutput },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::User { text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Turn::Model { text: text.into() }
    }
}

/// A conversation: the chat it belongs to plus its ordered turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// The Telegram chat this conversation belongs to.
    pub chat_id: ChatId,

    /// Ordered turns, appended only by the relay loop.
    pub turns: Vec<Turn>,

    /// When this conversation was created (or last reset).
    pub created_at: DateTime<Utc>,

    /// When the last turn was appended.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation for a chat.
    pub fn new(chat_id: ChatId) -> Self {
        let now = Utc::now();
        Self {
            chat_id,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// Clear all history (the `/start` command).
    pub fn reset(&mut self) {
        self.turns.clear();
        let now = Utc::now();
        self.created_at = now;
        self.updated_at = now;
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// The relay loop's terminal state, consumed by the delivery adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    /// The model's final natural-language reply.
    pub reply: String,

    /// A file produced during the turn, if any. The delivery adapter sends
    /// it as a document and removes it from disk.
    pub attachment: Option<PathBuf>,
}

impl RelayOutcome {
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            attachment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new(ChatId(7));
        let created = conv.created_at;

        conv.push(Turn::user("Boa noite"));
        assert_eq!(conv.turns.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn reset_clears_turns() {
        let mut conv = Conversation::new(ChatId(7));
        conv.push(Turn::user("oi"));
        conv.push(Turn::model("Olá, Senhor."));
        conv.reset();
        assert!(conv.turns.is_empty());
    }

    #[test]
    fn turn_serialization_is_tagged() {
        let turn = Turn::ToolCall {
            name: "buscar_web".into(),
            arguments: serde_json::json!({"query": "cotação do dólar"}),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains(r#""kind":"tool_call""#));
        assert!(json.contains("buscar_web"));

        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }

    #[test]
    fn tool_result_turn_carries_payload() {
        let turn = Turn::ToolResult {
            name: "ler_memoria".into(),
            output: ToolOutput::Text("10 de março".into()),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("10 de março"));
    }
}
