//! Savepoint CLI - savepoint command
//!
//! Watches a save directory and, after a quiet period following the
//! first change of a burst, drops a screenshot plus a zip snapshot of
//! the whole tree into the backup store.

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use savepoint_core::{BackupCommitter, BackupStore};
use savepoint_watcher::{CycleEvent, DebounceTrigger, ScreenshotHook, TreeWatcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod screenshot;

/// Savepoint - burst-coalescing backups for save directories
#[derive(Parser, Debug)]
#[command(name = "savepoint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory tree to watch for save activity (must exist)
    watched: PathBuf,

    /// Directory receiving archives and screenshots (created if missing)
    #[arg(default_value = ".")]
    backup: PathBuf,

    /// Quiet period in milliseconds after the first change of a burst
    #[arg(default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    quiet_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    anyhow::ensure!(
        cli.watched.is_dir(),
        "watched directory {} not found",
        cli.watched.display()
    );
    let watched = cli
        .watched
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", cli.watched.display()))?;
    let store = BackupStore::open(&cli.backup)?;

    println!("{} {}", "Source:".green(), watched.display());
    println!("{} {}", "Destination:".green(), store.root().display());
    println!();

    let hook: Arc<dyn ScreenshotHook> = Arc::new(screenshot::ActiveWindowCapture);
    let committer = BackupCommitter::new(&watched, store);
    let trigger = DebounceTrigger::new(
        committer,
        hook,
        Duration::from_millis(cli.quiet_ms),
    );

    // Per-cycle console feedback alongside the structured logs.
    let mut cycles = trigger.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = cycles.recv().await {
            match event {
                CycleEvent::Armed { id } => {
                    println!("{} {}", id.to_string().yellow(), "armed".dimmed());
                }
                CycleEvent::Committed { id, files, .. } => {
                    println!("{} {} ({} files)", id.to_string().yellow(), "ok".green(), files);
                }
                CycleEvent::Failed { id, error } => {
                    eprintln!("{} {}: {error}", id.to_string().yellow(), "failed".red());
                }
            }
        }
    });

    let mut watcher = TreeWatcher::start(&watched)?;
    info!(quiet_ms = cli.quiet_ms, "watching {}", watched.display());

    let watch_loop = async {
        while let Some(event) = watcher.recv().await {
            trigger.handle_event(&event);
        }
    };

    tokio::select! {
        _ = watch_loop => warn!("watcher channel closed, exiting"),
        _ = tokio::signal::ctrl_c() => info!("ctrl-c received, shutting down"),
    }

    Ok(())
}
