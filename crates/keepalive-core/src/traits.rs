//! Seams to the external collaborators: the endpoint registry and the chat notifier.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Mutex;

use crate::error::Result;

/// Durable mapping from endpoint URL to an opaque marker value.
///
/// Implementations must provide atomic per-key `put` / `delete`;
/// the core never performs read-modify-write sequences on it.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Lazily enumerate every key. Order is backend-defined but stable per call.
    fn keys(&self) -> BoxStream<'_, Result<String>>;

    /// Insert or overwrite.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Delivers plain-text messages to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;

    /// Best-effort delivery: failures are logged, never returned or retried.
    async fn deliver(&self, text: &str) {
        if let Err(e) = self.notify(text).await {
            tracing::error!("📭 Notification failed: {e}");
        }
    }
}

/// Notifier that keeps every message in memory.
///
/// Used for dry runs from the CLI and as a test double.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(text.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeepaliveError;

    struct BrokenNotifier;

    #[async_trait]
    impl Notifier for BrokenNotifier {
        async fn notify(&self, _text: &str) -> Result<()> {
            Err(KeepaliveError::Channel("down".into()))
        }
    }

    #[tokio::test]
    async fn deliver_swallows_failures() {
        BrokenNotifier.deliver("hello").await;
    }

    #[tokio::test]
    async fn recording_notifier_keeps_order() {
        let n = RecordingNotifier::new();
        n.deliver("one").await;
        n.notify("two").await.unwrap();
        assert_eq!(n.messages(), vec!["one", "two"]);
    }
}
