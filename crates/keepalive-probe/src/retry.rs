//! Bounded retries around a single-attempt [`Probe`].

use async_trait::async_trait;
use keepalive_core::config::ProbeConfig;
use keepalive_core::types::ProbeOutcome;
use std::time::Duration;

use crate::probe::Probe;

/// Detail used when every attempt failed without recording anything.
pub const UNKNOWN_ERROR_DETAIL: &str = "unknown error";

/// Produces the terminal outcome for one endpoint in a cycle.
#[async_trait]
pub trait EndpointProber: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Up to `max_attempts` attempts, sleeping `retry_delay` between failures.
pub struct RetryingProber<P> {
    probe: P,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<P: Probe> RetryingProber<P> {
    pub fn new(probe: P, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            probe,
            max_attempts,
            retry_delay,
        }
    }

    pub fn from_config(probe: P, config: &ProbeConfig) -> Self {
        Self::new(probe, config.max_attempts, config.retry_delay())
    }

    /// Stops at the first success. After the last failure there is no delay.
    pub async fn probe_with_retry(&self, url: &str) -> ProbeOutcome {
        let mut last_detail: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            let outcome = self.probe.probe_once(url).await;
            if outcome.success {
                if attempt > 1 {
                    tracing::info!(url = %url, attempt, "✅ Recovered after retry");
                }
                return outcome;
            }

            tracing::debug!(
                url = %url,
                attempt,
                max_attempts = self.max_attempts,
                detail = %outcome.detail,
                "Probe attempt failed"
            );
            last_detail = Some(outcome.detail);

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        let detail = last_detail
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_DETAIL.to_string());
        tracing::warn!(url = %url, detail = %detail, "❌ Endpoint unhealthy");
        ProbeOutcome::failed(url, detail)
    }
}

#[async_trait]
impl<P: Probe> EndpointProber for RetryingProber<P> {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.probe_with_retry(url).await
    }
}
