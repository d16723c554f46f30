//! Error types for the Mordomo domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Tool *execution* failures are deliberately absent: a failing tool reports
//! through its result payload (`ToolOutput::Error`) so the model can see the
//! failure and react, instead of aborting the whole turn.

use thiserror::Error;

/// The top-level error type for all Mordomo operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider (model API) errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel (Telegram) errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Note store errors ---
    #[error("Note store error: {0}")]
    Notes(#[from] NoteError),

    // --- Tool registry errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reaching or understanding the model API. These abort the current
/// turn and are never retried automatically.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to chat {chat_id}: {reason}")]
    DeliveryFailed { chat_id: i64, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid update payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Registry-level tool failures. `Unknown` means the model asked for a tool
/// that was never registered.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Duplicate tool registration: {0}")]
    Duplicate(String),
}
