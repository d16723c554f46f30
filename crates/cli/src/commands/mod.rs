//! CLI command implementations.

pub mod chat;
pub mod onboard;
pub mod run;
pub mod set_commands;
