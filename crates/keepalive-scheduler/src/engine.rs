//! Scheduler loop: waits for the next tick, then runs one scheduled cycle.
//! Cycles never overlap; a tick missed while a cycle is running is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use keepalive_agent::Keeper;
use keepalive_core::config::SchedulerConfig;
use keepalive_core::error::{KeepaliveError, Result};
use keepalive_core::types::Trigger;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cron::CronExpr;

/// When scheduled cycles fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Cron(CronExpr),
    Interval(Duration),
}

impl Schedule {
    /// `interval_secs` wins over `cron` when both are set.
    pub fn from_config(config: &SchedulerConfig) -> Result<Self> {
        match config.interval_secs {
            Some(0) => Err(KeepaliveError::Config(
                "scheduler.interval_secs must be greater than zero".into(),
            )),
            Some(secs) => Ok(Self::Interval(Duration::from_secs(secs))),
            None => CronExpr::parse(&config.cron).map(Self::Cron),
        }
    }

    /// Time to wait from `now` until the next tick.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::Interval(every) => Some(*every),
            Self::Cron(expr) => {
                let next = expr.next_after(now)?;
                (next - now).to_std().ok()
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Interval(every) => format!("every {}s", every.as_secs()),
            Self::Cron(_) => "cron".into(),
        }
    }
}

/// Spawn the scheduler loop as a background tokio task.
pub fn spawn_scheduler(keeper: Arc<Keeper>, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(run_scheduler(keeper, schedule))
}

async fn run_scheduler(keeper: Arc<Keeper>, schedule: Schedule) {
    tracing::info!("⏰ Scheduler started ({})", schedule.describe());

    match &schedule {
        Schedule::Interval(every) => {
            let mut interval = tokio::time::interval(*every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                fire(&keeper).await;
            }
        }
        Schedule::Cron(expr) => loop {
            let Some(delay) = schedule.delay_from(Utc::now()) else {
                tracing::warn!("⏰ Cron expression {expr:?} never fires again, scheduler stopped");
                return;
            };
            tokio::time::sleep(delay).await;
            fire(&keeper).await;
        },
    }
}

async fn fire(keeper: &Keeper) {
    tracing::debug!("⏰ Scheduled tick");
    match keeper.run_cycle(Trigger::Scheduled).await {
        Ok(Some(report)) => tracing::info!(
            "⏰ Scheduled cycle done: {} healthy, {} unhealthy",
            report.healthy.len(),
            report.unhealthy.len()
        ),
        Ok(None) => tracing::debug!("⏰ Scheduled cycle skipped, registry is empty"),
        Err(e) => tracing::error!("⏰ Scheduled cycle failed: {e}"),
    }
}
