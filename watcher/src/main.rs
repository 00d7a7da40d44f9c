//! Homework watcher — polls the Practicum homework API and relays review
//! status changes to a Telegram chat.
//!
//! Credentials come from the environment (or a `.env` file):
//! `PRACTICUM_TOKEN`, `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`, and optionally
//! `PRACTICUM_ENDPOINT`. Stop with Ctrl-C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use common::config::BotConfig;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telegram::TelegramNotifier;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer};

mod adapters;
mod error;
mod homework;
mod poller;

use adapters::practicum::PracticumApi;
use poller::{Poller, PollerSettings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pause between polling cycles, in seconds.
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,
    /// Start the first query window this many days before now.
    #[arg(long, default_value_t = 0)]
    lookback_days: u64,
    /// HTTP timeout for the status API.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout_secs: u64,
    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,
    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
    /// Also write logs to this file, truncated on start.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> PollerSettings {
        PollerSettings {
            interval: Duration::from_secs(self.interval_secs),
            initial_lookback: Duration::from_secs(self.lookback_days.saturating_mul(24 * 3600)),
        }
    }
}

/// Open the log file, dropping whatever a previous run left in it.
fn open_log_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Cannot open log file {}", path.display()))
}

fn init_tracing(json: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "homework_watcher=debug,telegram=debug".into());

    let stdout = if json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };
    let file = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(open_log_file(path)?))
                .boxed(),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs, args.log_file.as_deref())?;

    info!("Homework watcher v{}", env!("CARGO_PKG_VERSION"));

    let config = BotConfig::from_env().context("Конфигурация бота неполная")?;
    info!(endpoint = %config.endpoint, chat = %config.telegram_chat_id, "Configuration loaded");

    let api = Arc::new(PracticumApi::new(
        &config.endpoint,
        &config.practicum_token,
        Duration::from_secs(args.request_timeout_secs),
    ));
    let notifier = Arc::new(TelegramNotifier::from_config(&config));
    let mut poller = Poller::new(api, notifier, args.settings());

    if args.once {
        poller.run_cycle().await;
        return Ok(());
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(signal) => info!("Программа была остановлена: {}", signal),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        let _ = stop_tx.send(true);
    });

    poller.run(stop_rx).await;
    Ok(())
}

/// Wait for Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    let terminate = async {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        term.recv().await;
        Ok::<_, std::io::Error>("SIGTERM")
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<&'static str>>();

    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        res = terminate => res,
    }
}
