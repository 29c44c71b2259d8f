//! The keeper context: one explicitly constructed value holding everything a
//! cycle or a command needs. Transports and the scheduler only talk to this.

use futures::FutureExt;
use keepalive_core::config::KeepaliveConfig;
use keepalive_core::error::Result;
use keepalive_core::traits::{Notifier, Registry};
use keepalive_core::types::{IncomingMessage, Report, Trigger};
use keepalive_probe::{Aggregator, EndpointProber, HttpProbe, RetryingProber};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::dispatcher::Dispatcher;

pub struct Keeper {
    authorized_chat_id: String,
    dispatcher: Dispatcher,
    aggregator: Arc<Aggregator>,
}

impl Keeper {
    /// Build with the real HTTP prober from config.
    pub fn from_config(
        config: &KeepaliveConfig,
        registry: Arc<dyn Registry>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let probe = HttpProbe::new(&config.probe)?;
        let prober = Arc::new(RetryingProber::from_config(probe, &config.probe));
        Ok(Self::new(
            &config.telegram.chat_id,
            registry,
            notifier,
            prober,
            config.probe.max_concurrency,
        ))
    }

    pub fn new(
        authorized_chat_id: &str,
        registry: Arc<dyn Registry>,
        notifier: Arc<dyn Notifier>,
        prober: Arc<dyn EndpointProber>,
        max_concurrency: usize,
    ) -> Self {
        let aggregator = Arc::new(Aggregator::new(
            registry.clone(),
            notifier.clone(),
            prober,
            max_concurrency,
        ));
        Self {
            authorized_chat_id: authorized_chat_id.trim().to_string(),
            dispatcher: Dispatcher::new(registry, notifier, aggregator.clone()),
            aggregator,
        }
    }

    pub fn is_authorized(&self, message: &IncomingMessage) -> bool {
        !self.authorized_chat_id.is_empty() && message.chat_id == self.authorized_chat_id
    }

    /// Handle one inbound message. Unauthorized messages are dropped silently;
    /// every failure is logged here and goes no further.
    pub async fn handle_message(&self, message: IncomingMessage) {
        if !self.is_authorized(&message) {
            tracing::debug!("🚫 Ignoring message from chat {}", message.chat_id);
            return;
        }
        if let Err(e) = self.dispatcher.dispatch(&message.text).await {
            tracing::error!("❌ Command failed: {e}");
        }
    }

    /// Handle a message in the background so the caller can acknowledge at once.
    pub fn spawn_message(self: &Arc<Self>, message: IncomingMessage) -> JoinHandle<()> {
        let keeper = Arc::clone(self);
        tokio::spawn(async move {
            let handled = AssertUnwindSafe(keeper.handle_message(message))
                .catch_unwind()
                .await;
            if handled.is_err() {
                tracing::error!("💥 Command handler panicked");
            }
        })
    }

    pub async fn run_cycle(&self, trigger: Trigger) -> Result<Option<Report>> {
        self.aggregator.run_cycle(trigger).await
    }
}
