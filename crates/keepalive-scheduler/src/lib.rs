//! # Keepalive Scheduler
//!
//! The periodic trigger. Sleeps until the next tick of a cron expression or
//! fixed interval, then runs one scheduled cycle. Tokio timers only.

pub mod cron;
pub mod engine;

pub use cron::CronExpr;
pub use engine::{Schedule, spawn_scheduler};
