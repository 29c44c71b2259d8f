//! Telegram Bot channel: message sending, webhook management, and long polling.

use async_trait::async_trait;
use futures::stream::Stream;
use keepalive_core::config::TelegramConfig;
use keepalive_core::error::{KeepaliveError, Result};
use keepalive_core::traits::Notifier;
use keepalive_core::types::IncomingMessage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Long-poll window passed to `getUpdates`, in seconds.
const LONG_POLL_SECS: u64 = 30;

/// Thin Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_base(&config.api_base, &config.bot_token)
    }

    pub fn with_base(api_base: &str, bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// POST a Bot API method and unwrap the `{ok, result, description}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<Option<T>> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| KeepaliveError::Channel(format!("Telegram {method} failed: {}", e.without_url())))?;

        let status = response.status();
        let body: TelegramApiResponse<T> = response.json().await.map_err(|e| {
            KeepaliveError::Channel(format!("Invalid Telegram {method} response ({status}): {e}"))
        })?;

        if !body.ok {
            return Err(KeepaliveError::Channel(format!(
                "Telegram API error on {method}: {}",
                body.description.unwrap_or_default()
            )));
        }
        Ok(body.result)
    }

    /// Send a plain-text message with link previews disabled.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        self.call::<serde_json::Value>("sendMessage", body, Duration::from_secs(10))
            .await?;
        Ok(())
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", serde_json::json!({}), Duration::from_secs(10))
            .await?
            .ok_or_else(|| KeepaliveError::Channel("No bot info".into()))
    }

    /// Fetch updates after `offset`, waiting up to `timeout_secs` for new ones.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<TelegramUpdate>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        let updates = self
            .call("getUpdates", body, Duration::from_secs(timeout_secs + 10))
            .await?;
        Ok(updates.unwrap_or_default())
    }

    /// Point Telegram at the gateway.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let body = serde_json::json!({ "url": url, "allowed_updates": ["message"] });
        self.call::<serde_json::Value>("setWebhook", body, Duration::from_secs(10))
            .await?;
        tracing::info!("🔗 Telegram webhook set to {url}");
        Ok(())
    }

    /// Required before switching to long polling.
    pub async fn delete_webhook(&self) -> Result<()> {
        self.call::<serde_json::Value>("deleteWebhook", serde_json::json!({}), Duration::from_secs(10))
            .await?;
        tracing::info!("🔗 Telegram webhook removed");
        Ok(())
    }

    /// Start the polling loop, returning a stream of IncomingMessages.
    pub fn start_polling(self, poll_interval: Duration) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut offset = 0i64;
            tracing::info!("Telegram polling loop started");

            loop {
                match self.get_updates(offset, LONG_POLL_SECS).await {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            let Some(msg) = update.to_incoming() else {
                                continue;
                            };
                            if tx.send(msg).is_err() {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }

                if tx.is_closed() {
                    return;
                }
                tokio::time::sleep(poll_interval).await;
            }
        });

        TelegramPollingStream { rx }
    }
}

/// Stream of incoming Telegram messages from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<IncomingMessage>,
}

impl Stream for TelegramPollingStream {
    type Item = IncomingMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Sends every notification to the one authorized chat.
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.client.send_message(&self.chat_id, text).await
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

impl TelegramUpdate {
    /// Text messages only; anything else (edits, stickers, joins) is `None`.
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        let msg = self.message.as_ref()?;
        let text = msg.text.as_ref()?;
        Some(IncomingMessage {
            chat_id: msg.chat.id.to_string(),
            text: text.clone(),
        })
    }
}
