//! The relay loop and per-chat session bookkeeping.
//!
//! `RelayLoop` drives one user turn to completion: submit the conversation
//! to the provider, execute any requested tools, feed the results back, and
//! stop at the model's final text reply (or at the round bound). `SessionMap`
//! hands out one lock per chat so turns within a chat never interleave.

pub mod loop_runner;
pub mod sessions;

pub use loop_runner::RelayLoop;
pub use sessions::SessionMap;
