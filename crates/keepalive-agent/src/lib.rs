//! # Keepalive Agent
//!
//! Turns operator messages into actions. [`Dispatcher`] maps one message to
//! one command; [`Keeper`] adds the authorization gate and runs handling
//! detached from whoever delivered the message.

pub mod dispatcher;
pub mod keeper;

pub use dispatcher::{Dispatcher, HELP_TEXT};
pub use keeper::Keeper;
