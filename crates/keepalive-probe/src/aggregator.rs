//! One probing cycle: fan out over the registry, join, partition, report.

use futures::TryStreamExt;
use keepalive_core::error::{KeepaliveError, Result};
use keepalive_core::traits::{Notifier, Registry};
use keepalive_core::types::{ProbeOutcome, Report, Trigger};
use std::sync::Arc;

use crate::retry::EndpointProber;

/// Sent instead of a report when a manual cycle finds nothing to probe.
pub const NO_ENDPOINTS_TEXT: &str = "📭 No endpoints are being kept alive yet";

pub struct Aggregator {
    registry: Arc<dyn Registry>,
    notifier: Arc<dyn Notifier>,
    prober: Arc<dyn EndpointProber>,
    max_concurrency: usize,
}

impl Aggregator {
    pub fn new(
        registry: Arc<dyn Registry>,
        notifier: Arc<dyn Notifier>,
        prober: Arc<dyn EndpointProber>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            registry,
            notifier,
            prober,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Probe every registered endpoint, at most `max_concurrency` at a time.
    ///
    /// Outcomes come back in registry scan order regardless of which probe
    /// finished first. A registry read error aborts the cycle.
    pub async fn probe_all(&self) -> Result<Vec<ProbeOutcome>> {
        let prober = &self.prober;
        self.registry
            .keys()
            .map_ok(|url| async move { Ok::<_, KeepaliveError>(prober.probe(&url).await) })
            .try_buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    /// Run one cycle and deliver its result.
    ///
    /// Empty registry: a manual cycle sends a notice, a scheduled one sends
    /// nothing. Otherwise exactly one report is sent and also returned.
    pub async fn run_cycle(&self, trigger: Trigger) -> Result<Option<Report>> {
        tracing::info!("🔍 Starting {:?} cycle (registry: {})", trigger, self.registry.name());
        let outcomes = self.probe_all().await?;

        if outcomes.is_empty() {
            if trigger.is_manual() {
                self.notifier.deliver(NO_ENDPOINTS_TEXT).await;
            } else {
                tracing::debug!("Registry empty, skipping scheduled report");
            }
            return Ok(None);
        }

        let report = Report::from_outcomes(trigger, outcomes);
        tracing::info!(
            "📋 Cycle done: {} healthy, {} unhealthy",
            report.healthy.len(),
            report.unhealthy.len()
        );
        self.notifier.deliver(&report.render()).await;
        Ok(Some(report))
    }
}
