//! # Keepalive Gateway
//!
//! Axum server receiving Telegram webhook updates. Every POST is acknowledged
//! with `OK` immediately; the message itself is handled on a detached task.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
