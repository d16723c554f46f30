//! Model API client implementations for Mordomo.
//!
//! Only Gemini is implemented — the relay loop talks to the `Provider`
//! trait from `mordomo-core`, so adding another backend means adding
//! another module here.

pub mod gemini;

pub use gemini::GeminiProvider;
