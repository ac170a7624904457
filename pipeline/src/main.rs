//! **Indexer CLI**
//!
//! The command-line entry point for the ingest engine: merges configuration
//! (compiled-in defaults, an optional TOML file, `IDX_`-prefixed
//! environment variables, and these CLI flags, in that order of increasing
//! precedence), initializes logging, and dispatches to `pipeline::ingest`
//! for either a one-shot `backfill` over a closed height range or a
//! `follow` run that backfills to the chain tip and then polls forever.
//!
//! SIGINT/SIGTERM trigger a graceful shutdown: a shared `CancellationToken`
//! is cancelled, the range/follow runner stops accepting new work, and the
//! sink gets a final flush+close before the process exits.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use config::{Config, ToHeight};

/// Cosmos SDK / CometBFT block ingest engine.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to a TOML configuration file; defaults to the platform config
    /// directory (`~/.config/indexer/config.toml` on Linux) if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `source.rpc_url`.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Override `range.from`.
    #[arg(long)]
    from: Option<u64>,

    /// Override `range.to` (a height, or the literal `latest`).
    #[arg(long)]
    to: Option<String>,

    /// Resume from the sink's last committed height for this progress id.
    #[arg(long)]
    resume: bool,

    /// Path to a serialized `FileDescriptorSet` for the dynamic decoder
    /// registry; without it, only the fast-path message types decode.
    #[arg(long)]
    descriptor_set: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest `[from, to]` and exit once the range is fully flushed.
    Backfill,
    /// Ingest up to the chain tip, then continue polling for new blocks
    /// forever (until a shutdown signal arrives).
    Follow,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(Config, Option<PathBuf>)> {
        let config_path = self.config.clone().or_else(Config::default_path);
        let mut cfg = Config::from_sources(config_path.as_deref())?;

        if let Some(rpc_url) = self.rpc_url {
            cfg.source.rpc_url = rpc_url;
        }
        if let Some(from) = self.from {
            cfg.range.from = Some(from);
        }
        if let Some(to) = self.to {
            cfg.range.to = Some(to.parse::<ToHeight>()?);
        }
        if self.resume {
            cfg.range.resume = true;
        }
        cfg.range.follow = matches!(self.command, Command::Follow);

        Ok((cfg, self.descriptor_set))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::parse();
    let (cfg, descriptor_set) = match cli.into_config() {
        Ok(v) => v,
        Err(err) => {
            tracing::error!(error = %err, "failed to build configuration");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received, draining in-flight work");
        shutdown_cancel.cancel();
    });

    match pipeline::ingest(&cfg, descriptor_set.as_deref(), cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "indexer exited with a fatal error");
            ExitCode::FAILURE
        }
    }
}

/// Wait for either SIGINT (ctrl-c, all platforms) or SIGTERM (unix only).
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
