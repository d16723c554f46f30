//! # Mordomo Core
//!
//! Domain types, traits, and error definitions for the Mordomo Telegram
//! assistant. This crate has no HTTP or platform dependencies — it defines
//! the domain model that all other crates implement against.
//!
//! The relay loop, the Gemini client, the Telegram channel, and every tool
//! depend inward on the traits defined here, so each can be swapped for a
//! mock in tests.

pub mod channel;
pub mod conversation;
pub mod error;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChatId, IncomingMessage, PresenceAction};
pub use conversation::{Conversation, RelayOutcome, Turn};
pub use error::{Error, Result};
pub use provider::{ModelReply, Provider, ProviderRequest, ToolInvocation};
pub use tool::{Tool, ToolDescriptor, ToolOutput, ToolRegistry};
