//! # Keepalive Core
//!
//! Shared building blocks for the uptime keeper:
//! configuration, the error type, domain types, the URL validator,
//! and the `Registry` / `Notifier` seams every other crate plugs into.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod validate;

pub use config::KeepaliveConfig;
pub use error::{KeepaliveError, Result};
pub use traits::{Notifier, RecordingNotifier, Registry};
pub use types::{Command, IncomingMessage, ProbeOutcome, Report, Trigger};
pub use validate::is_valid_endpoint;

/// Crate version, reported by the gateway health route.
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
