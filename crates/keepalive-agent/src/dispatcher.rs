//! Command dispatch: classify inbound text and apply it to the registry.

use futures::TryStreamExt;
use keepalive_core::error::Result;
use keepalive_core::traits::{Notifier, Registry};
use keepalive_core::types::{Command, ENDPOINT_MARKER, Trigger};
use keepalive_core::validate::is_valid_endpoint;
use keepalive_probe::{Aggregator, NO_ENDPOINTS_TEXT};
use std::sync::Arc;

pub const HELP_TEXT: &str = "\
📌 How to use:
Send a link starting with http:// or https:// → keep that site alive

Commands:
/list   show every site being kept alive
/remove <url>   stop keeping a site alive
/check   run a check right now
/help   show this help";

pub const INVALID_URL_TEXT: &str = "❌ Invalid URL format";
pub const CHECKING_TEXT: &str = "🚀 Checking all sites now, please wait...";

/// Stateless per message; all durable state lives in the registry.
pub struct Dispatcher {
    registry: Arc<dyn Registry>,
    notifier: Arc<dyn Notifier>,
    aggregator: Arc<Aggregator>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<dyn Registry>,
        notifier: Arc<dyn Notifier>,
        aggregator: Arc<Aggregator>,
    ) -> Self {
        Self {
            registry,
            notifier,
            aggregator,
        }
    }

    /// Parse and handle one message. Returns the command that was applied.
    ///
    /// Errors are registry failures only; notification failures are logged
    /// and swallowed.
    pub async fn dispatch(&self, text: &str) -> Result<Command> {
        let command = Command::parse(text);
        tracing::debug!("📨 Dispatching {command:?}");
        self.handle(&command).await?;
        Ok(command)
    }

    pub async fn handle(&self, command: &Command) -> Result<()> {
        match command {
            Command::Help | Command::Unrecognized => self.notifier.deliver(HELP_TEXT).await,
            Command::List => self.list().await?,
            Command::Remove(url) => self.remove(url).await?,
            Command::Check => {
                self.notifier.deliver(CHECKING_TEXT).await;
                self.aggregator.run_cycle(Trigger::Manual).await?;
            }
            Command::AddEndpoint(url) => self.add(url).await?,
        }
        Ok(())
    }

    async fn list(&self) -> Result<()> {
        let mut msg = String::new();
        let mut count = 0usize;
        let mut keys = self.registry.keys();
        while let Some(url) = keys.try_next().await? {
            count += 1;
            msg.push_str(&format!("{count}. {url}\n"));
        }

        if count == 0 {
            self.notifier.deliver(NO_ENDPOINTS_TEXT).await;
        } else {
            self.notifier
                .deliver(&format!("📌 Sites being kept alive:\n\n{msg}"))
                .await;
        }
        Ok(())
    }

    async fn remove(&self, url: &str) -> Result<()> {
        if !is_valid_endpoint(url) {
            self.notifier.deliver(INVALID_URL_TEXT).await;
            return Ok(());
        }
        self.registry.delete(url).await?;
        tracing::info!("🗑 Endpoint removed: {url}");
        self.notifier.deliver(&format!("🗑 Removed:\n{url}")).await;
        Ok(())
    }

    async fn add(&self, url: &str) -> Result<()> {
        self.registry.put(url, ENDPOINT_MARKER).await?;
        tracing::info!("➕ Endpoint added: {url}");
        self.notifier
            .deliver(&format!("✅ Now keeping alive:\n{url}"))
            .await;
        Ok(())
    }
}
