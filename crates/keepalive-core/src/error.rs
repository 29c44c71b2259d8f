//! Error type shared across keepalive crates.

use thiserror::Error;

/// Everything that can go wrong outside of a probe attempt.
///
/// Probe failures are not errors: they are recorded as failed
/// [`ProbeOutcome`](crate::types::ProbeOutcome)s.
#[derive(Debug, Error)]
pub enum KeepaliveError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, KeepaliveError>;
