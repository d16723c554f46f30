//! Channel trait — the abstraction over the messaging platform.
//!
//! A Channel receives inbound text messages and sends back text replies,
//! presence indicators, and document attachments. Only Telegram is
//! implemented, but the dispatcher and delivery adapter are written against
//! this trait so tests can use fakes.

use crate::error::ChannelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A Telegram chat identifier, as supplied by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inbound message from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// The chat the message arrived in.
    pub chat_id: ChatId,

    /// Sender identifier (platform-specific user id).
    pub sender_id: String,

    /// Human-readable sender name (if available).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    /// The text content. Non-text updates never reach the dispatcher.
    pub text: String,
}

/// Presence indicator shown while a turn is in flight. Best effort —
/// failures are ignored, never part of correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceAction {
    Typing,
    UploadingDocument,
}

/// The core Channel trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    ///
    /// Returns a receiver that yields incoming messages. The channel
    /// implementation handles long polling internally.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<IncomingMessage, ChannelError>>,
        ChannelError,
    >;

    /// Send a text reply to a chat.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> std::result::Result<(), ChannelError>;

    /// Send a local file as a document attachment.
    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> std::result::Result<(), ChannelError>;

    /// Show a presence indicator (typing / uploading a document).
    async fn send_presence(
        &self,
        _chat_id: ChatId,
        _action: PresenceAction,
    ) -> std::result::Result<(), ChannelError> {
        Ok(()) // No-op default
    }

    /// Check if a sender is allowed (allowlist check).
    fn is_allowed(&self, sender_id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_display() {
        assert_eq!(ChatId(-100123).to_string(), "-100123");
    }

    #[test]
    fn incoming_message_roundtrip() {
        let msg = IncomingMessage {
            chat_id: ChatId(99),
            sender_id: "12345".into(),
            sender_name: Some("Alice".into()),
            text: "Qual é a capital da França?".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: IncomingMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chat_id, ChatId(99));
        assert_eq!(back.text, msg.text);
    }
}
