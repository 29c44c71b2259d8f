//! Domain types: probe outcomes, reports, and control commands.

use chrono::{DateTime, FixedOffset, Utc};

use crate::validate::{is_url_whitespace, is_valid_endpoint};

/// Marker value stored against every registered endpoint.
pub const ENDPOINT_MARKER: &str = "1";

/// Terminal (or single-attempt) result of probing one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub url: String,
    pub success: bool,
    /// Status code as text, `"timeout"`, or the transport error text.
    pub detail: String,
}

impl ProbeOutcome {
    pub fn ok(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: true,
            detail: detail.into(),
        }
    }

    pub fn failed(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            detail: detail.into(),
        }
    }
}

/// What started a probing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Operator sent `/check`.
    Manual,
    /// Periodic trigger fired.
    Scheduled,
}

impl Trigger {
    pub fn is_manual(self) -> bool {
        matches!(self, Trigger::Manual)
    }
}

/// Outcome of one cycle, partitioned by health.
#[derive(Debug, Clone)]
pub struct Report {
    pub trigger: Trigger,
    pub healthy: Vec<ProbeOutcome>,
    pub unhealthy: Vec<ProbeOutcome>,
    pub generated_at: DateTime<Utc>,
}

/// Reports render timestamps in China Standard Time (Asia/Shanghai, UTC+8, no DST).
const SHANGHAI_OFFSET_SECS: i32 = 8 * 3600;

impl Report {
    /// Stable partition of `outcomes`: input order is kept within each half.
    pub fn from_outcomes(trigger: Trigger, outcomes: Vec<ProbeOutcome>) -> Self {
        let (healthy, unhealthy) = outcomes.into_iter().partition(|o| o.success);
        Self {
            trigger,
            healthy,
            unhealthy,
            generated_at: Utc::now(),
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.unhealthy.is_empty()
    }

    /// Human-readable report text sent to the operator.
    pub fn render(&self) -> String {
        let kind = if self.trigger.is_manual() {
            "Manual check"
        } else {
            "Scheduled check"
        };
        let mut msg = if self.all_healthy() {
            format!("🟢 {kind} complete (all healthy)\n\n")
        } else {
            format!("🔴 {kind} complete (problems detected)\n\n")
        };
        for o in &self.healthy {
            msg.push_str(&format!("✅ {} → {}\n", o.url, o.detail));
        }
        for o in &self.unhealthy {
            msg.push_str(&format!("❌ {} → {}\n", o.url, o.detail));
        }
        msg.push_str(&format!("\n⏱ Checked at: {}", self.local_time()));
        msg
    }

    fn local_time(&self) -> String {
        let Some(offset) = FixedOffset::east_opt(SHANGHAI_OFFSET_SECS) else {
            return self.generated_at.format("%Y/%-m/%-d %H:%M:%S UTC").to_string();
        };
        self.generated_at
            .with_timezone(&offset)
            .format("%Y/%-m/%-d %H:%M:%S")
            .to_string()
    }
}

/// A parsed control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    /// Argument after `/remove`, trimmed; may be invalid or empty.
    Remove(String),
    Check,
    AddEndpoint(String),
    Unrecognized,
}

impl Command {
    /// Classify inbound text. First match wins:
    /// `/help`, `/list`, `/remove…`, `/check`, a valid URL, anything else.
    pub fn parse(text: &str) -> Self {
        let text = text.trim_matches(is_url_whitespace);
        if text == "/help" {
            Command::Help
        } else if text == "/list" {
            Command::List
        } else if let Some(rest) = text.strip_prefix("/remove") {
            Command::Remove(rest.trim_matches(is_url_whitespace).to_string())
        } else if text == "/check" {
            Command::Check
        } else if is_valid_endpoint(text) {
            Command::AddEndpoint(text.to_string())
        } else {
            Command::Unrecognized
        }
    }
}

/// An inbound control message, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Chat the message came from; compared against the authorized chat id.
    pub chat_id: String,
    pub text: String,
}
