//! Messaging channel adapters.
//!
//! Only Telegram is implemented. The delivery adapter sits between the relay
//! loop's outcome and the channel, and owns temp-file cleanup for document
//! attachments.

pub mod delivery;
pub mod telegram;

pub use delivery::deliver;
pub use telegram::{BotCommand, TelegramChannel, TelegramConfig};
