//! # Keepalive Channels
//! Chat transport: the operator's control channel and notification sink.

pub mod telegram;

pub use telegram::{TelegramClient, TelegramNotifier, TelegramPollingStream, TelegramUpdate};
