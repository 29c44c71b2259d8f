//! Single liveness attempt against one URL.

use async_trait::async_trait;
use keepalive_core::config::ProbeConfig;
use keepalive_core::error::Result;
use keepalive_core::types::ProbeOutcome;
use rand::Rng;
use reqwest::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use std::error::Error as _;
use std::time::Duration;

/// Failure detail for an attempt aborted by the per-attempt timeout.
pub const TIMEOUT_DETAIL: &str = "timeout";

/// One attempt, no retries. Never fails: errors become failed outcomes.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe_once(&self, url: &str) -> ProbeOutcome;
}

/// `GET` probe over reqwest with no-cache headers and a browser user agent.
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe_once(&self, url: &str) -> ProbeOutcome {
        let target = cache_busted(url);
        tracing::debug!(url = %url, target = %target, "Probing");

        let request = self
            .client
            .get(&target)
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .send();

        // The timer owns this attempt only; dropping the future aborts the request.
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(resp)) => {
                let status = resp.status();
                if status.is_success() {
                    ProbeOutcome::ok(url, status.as_u16().to_string())
                } else {
                    ProbeOutcome::failed(url, status.as_u16().to_string())
                }
            }
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::failed(url, TIMEOUT_DETAIL),
            Ok(Err(e)) => ProbeOutcome::failed(url, describe(&e)),
            Err(_) => ProbeOutcome::failed(url, TIMEOUT_DETAIL),
        }
    }
}

/// Append `_nocache=<millis><0..1000>` so caches in front of the endpoint are bypassed.
pub fn cache_busted(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    let millis = chrono::Utc::now().timestamp_millis();
    let salt: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{url}{separator}_nocache={millis}{salt}")
}

/// Innermost cause of a transport error, without the (cache-busted) URL.
fn describe(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg = cause.to_string();
        source = cause.source();
    }
    msg
}
