//! # Keepalive
//!
//! Keeps a list of HTTP endpoints awake and reports their health to one
//! Telegram chat.
//!
//! Usage:
//!   keepalive                            # Serve (webhook or polling) + scheduler
//!   keepalive check --manual             # One cycle now, reported as manual
//!   keepalive check --dry-run            # One cycle, print the report instead of sending
//!   keepalive set-webhook https://host/  # Point the bot at this server

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use keepalive_agent::Keeper;
use keepalive_channels::{TelegramClient, TelegramNotifier};
use keepalive_core::config::InboundMode;
use keepalive_core::{KeepaliveConfig, Notifier, RecordingNotifier, Registry, Trigger};
use keepalive_scheduler::{Schedule, spawn_scheduler};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "keepalive",
    version,
    about = "🛰 Keepalive: keeps HTTP endpoints awake and reports to Telegram"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ~/.keepalive/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive commands and run scheduled checks (default)
    Serve,
    /// Probe every registered endpoint once
    Check {
        /// Report as a manual check (an empty registry is announced)
        #[arg(long)]
        manual: bool,
        /// Print the report to stdout instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Register the Telegram webhook URL
    SetWebhook { url: String },
    /// Remove the Telegram webhook
    DeleteWebhook,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let command = cli.command.unwrap_or(Commands::Serve);
    let config = load_config(cli.config.as_deref(), command.needs_telegram())?;

    match command {
        Commands::Serve => serve(config).await,
        Commands::Check { manual, dry_run } => check(config, manual, dry_run).await,
        Commands::SetWebhook { url } => {
            TelegramClient::new(&config.telegram).set_webhook(&url).await?;
            println!("✅ Webhook set to {url}");
            Ok(())
        }
        Commands::DeleteWebhook => {
            TelegramClient::new(&config.telegram).delete_webhook().await?;
            println!("✅ Webhook removed");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "keepalive=debug,keepalive_core=debug,keepalive_probe=debug,keepalive_registry=debug,\
         keepalive_channels=debug,keepalive_agent=debug,keepalive_scheduler=debug,\
         keepalive_gateway=debug,tower_http=debug"
    } else {
        "keepalive=info,keepalive_core=info,keepalive_probe=info,keepalive_registry=info,\
         keepalive_channels=info,keepalive_agent=info,keepalive_scheduler=info,\
         keepalive_gateway=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

impl Commands {
    /// A dry-run check never talks to Telegram, so it runs without credentials.
    fn needs_telegram(&self) -> bool {
        !matches!(self, Commands::Check { dry_run: true, .. })
    }
}

fn load_config(path: Option<&std::path::Path>, needs_telegram: bool) -> Result<KeepaliveConfig> {
    let mut config = match path {
        Some(p) => KeepaliveConfig::load_from(p)?,
        None => KeepaliveConfig::load()?,
    };
    config.apply_env();
    if needs_telegram {
        config.validate()?;
    } else {
        config.validate_settings()?;
    }
    Ok(config)
}

fn build_keeper(config: &KeepaliveConfig, notifier: Arc<dyn Notifier>) -> Result<Arc<Keeper>> {
    let registry = keepalive_registry::create_registry(&config.registry)?;
    tracing::info!("📚 Registry: {}", registry.name());
    Ok(Arc::new(Keeper::from_config(config, registry, notifier)?))
}

async fn serve(config: KeepaliveConfig) -> Result<()> {
    let client = TelegramClient::new(&config.telegram);
    match client.get_me().await {
        Ok(me) => tracing::info!(
            "🤖 Bot @{} ready",
            me.username.as_deref().unwrap_or(&me.first_name)
        ),
        Err(e) => tracing::warn!("⚠️ Could not reach Telegram yet: {e}"),
    }

    let notifier = Arc::new(TelegramNotifier::new(
        client.clone(),
        config.telegram.chat_id.clone(),
    ));
    let keeper = build_keeper(&config, notifier)?;

    if config.scheduler.enabled {
        let schedule = Schedule::from_config(&config.scheduler)?;
        spawn_scheduler(keeper.clone(), schedule);
    } else {
        tracing::info!("⏰ Scheduler disabled");
    }

    match config.telegram.inbound {
        InboundMode::Webhook => keepalive_gateway::start(&config.gateway, keeper).await,
        InboundMode::Polling => {
            // getUpdates is refused while a webhook is registered.
            if let Err(e) = client.delete_webhook().await {
                tracing::warn!("⚠️ Could not remove webhook before polling: {e}");
            }
            let interval = Duration::from_secs(config.telegram.poll_interval_secs);
            let mut messages = client.start_polling(interval);

            loop {
                tokio::select! {
                    message = messages.next() => match message {
                        Some(message) => drop(keeper.spawn_message(message)),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("👋 Shutting down");
                        break;
                    }
                }
            }
            Ok(())
        }
    }
}

async fn check(config: KeepaliveConfig, manual: bool, dry_run: bool) -> Result<()> {
    let recorder = Arc::new(RecordingNotifier::new());
    let notifier: Arc<dyn Notifier> = if dry_run {
        recorder.clone()
    } else {
        Arc::new(TelegramNotifier::new(
            TelegramClient::new(&config.telegram),
            config.telegram.chat_id.clone(),
        ))
    };
    let keeper = build_keeper(&config, notifier)?;

    let trigger = if manual { Trigger::Manual } else { Trigger::Scheduled };
    match keeper.run_cycle(trigger).await? {
        Some(report) => tracing::info!(
            "✅ Cycle done: {} healthy, {} unhealthy",
            report.healthy.len(),
            report.unhealthy.len()
        ),
        None => tracing::info!("📭 Registry is empty"),
    }

    for message in recorder.messages() {
        println!("{message}");
    }
    Ok(())
}
