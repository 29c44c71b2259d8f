//! Keepalive configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{KeepaliveError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl KeepaliveConfig {
    /// Load config from the default path (~/.keepalive/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeepaliveError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay secrets and the listen port from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay from an arbitrary lookup: `TG_BOT_TOKEN`, `TG_CHAT_ID`, `KEEPALIVE_PORT`.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TG_BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup("TG_CHAT_ID").filter(|v| !v.is_empty()) {
            self.telegram.chat_id = chat_id;
        }
        if let Some(port) = lookup("KEEPALIVE_PORT") {
            match port.parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => tracing::warn!("⚠️ Ignoring invalid KEEPALIVE_PORT '{port}'"),
            }
        }
    }

    /// Reject configs the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_settings()
    }

    /// Telegram credentials, needed by anything that talks to the bot.
    pub fn validate_credentials(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(KeepaliveError::Config(
                "telegram.bot_token is required (or set TG_BOT_TOKEN)".into(),
            ));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(KeepaliveError::Config(
                "telegram.chat_id is required (or set TG_CHAT_ID)".into(),
            ));
        }
        Ok(())
    }

    /// Everything except credentials; enough for an offline dry run.
    pub fn validate_settings(&self) -> Result<()> {
        if self.probe.max_attempts == 0 {
            return Err(KeepaliveError::Config("probe.max_attempts must be >= 1".into()));
        }
        if self.probe.timeout_ms == 0 {
            return Err(KeepaliveError::Config("probe.timeout_ms must be > 0".into()));
        }
        if self.registry.page_size == 0 {
            return Err(KeepaliveError::Config("registry.page_size must be > 0".into()));
        }
        if !self.gateway.webhook_path.starts_with('/') {
            return Err(KeepaliveError::Config(
                "gateway.webhook_path must start with '/'".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the keepalive home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".keepalive")
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// The single authorized chat. Inbound messages from other chats are dropped.
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub inbound: InboundMode,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_api_base() -> String { "https://api.telegram.org".into() }
fn default_poll_interval() -> u64 { 1 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            inbound: InboundMode::default(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// How inbound commands reach the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundMode {
    /// Telegram pushes updates to the gateway.
    #[default]
    Webhook,
    /// The service long-polls `getUpdates`.
    Polling,
}

/// Probe timing and fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upper bound on endpoints probed at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_timeout_ms() -> u64 { 10_000 }
fn default_max_attempts() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 5_000 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36".into()
}
fn default_max_concurrency() -> usize { 64 }

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Endpoint registry storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackend,
    #[serde(default = "default_registry_path")]
    pub path: String,
    /// Keys fetched per page when listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_registry_path() -> String { "~/.keepalive/endpoints.db".into() }
fn default_page_size() -> u32 { 500 }

impl RegistryConfig {
    /// `path` with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            path: default_registry_path(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path Telegram posts updates to.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8787 }
fn default_webhook_path() -> String { "/".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// Periodic trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// 5-field cron expression, evaluated in UTC.
    #[serde(default = "default_cron")]
    pub cron: String,
    /// Fixed interval; takes precedence over `cron` when set.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

fn bool_true() -> bool { true }
fn default_cron() -> String { "*/10 * * * *".into() }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_cron(),
            interval_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = KeepaliveConfig::default();
        assert_eq!(config.probe.timeout_ms, 10_000);
        assert_eq!(config.probe.max_attempts, 3);
        assert_eq!(config.probe.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.inbound, InboundMode::Webhook);
        assert_eq!(config.registry.backend, RegistryBackend::Sqlite);
        assert!(config.scheduler.enabled);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "42"
            inbound = "polling"

            [probe]
            retry_delay_ms = 250
            max_concurrency = 8

            [registry]
            backend = "memory"

            [scheduler]
            interval_secs = 300
        "#;

        let config: KeepaliveConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.inbound, InboundMode::Polling);
        assert_eq!(config.probe.retry_delay_ms, 250);
        assert_eq!(config.probe.timeout_ms, 10_000);
        assert_eq!(config.probe.max_concurrency, 8);
        assert_eq!(config.registry.backend, RegistryBackend::Memory);
        assert_eq!(config.scheduler.interval_secs, Some(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: KeepaliveConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 8787);
        assert_eq!(config.gateway.webhook_path, "/");
        assert_eq!(config.scheduler.cron, "*/10 * * * *");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway]\nport = 9000\n").unwrap();
        let config = KeepaliveConfig::load_from(&path).unwrap();
        assert_eq!(config.gateway.port, 9000);

        let missing = KeepaliveConfig::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(KeepaliveError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TG_BOT_TOKEN", "999:zzz"),
            ("TG_CHAT_ID", "-100"),
            ("KEEPALIVE_PORT", "not-a-port"),
        ]
        .into_iter()
        .collect();
        let mut config = KeepaliveConfig::default();
        config.gateway.port = 1234;
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.telegram.bot_token, "999:zzz");
        assert_eq!(config.telegram.chat_id, "-100");
        assert_eq!(config.gateway.port, 1234);
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let mut config = KeepaliveConfig::default();
        assert!(config.validate().is_err());
        config.telegram.bot_token = "t".into();
        assert!(config.validate().is_err());
        config.telegram.chat_id = "1".into();
        assert!(config.validate().is_ok());
        config.probe.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_validate_without_credentials() {
        let mut config = KeepaliveConfig::default();
        assert!(config.validate_credentials().is_err());
        assert!(config.validate_settings().is_ok());

        config.gateway.webhook_path = "hook".into();
        assert!(config.validate_settings().is_err());
    }

    #[test]
    fn test_home_dir() {
        let home = KeepaliveConfig::home_dir();
        assert!(home.to_string_lossy().contains(".keepalive"));
    }
}
