//! vcr-sync CLI - keeps a replicator cluster's topology in sync with its source cluster

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};
use vcr_sync::shutdown::{ShutdownCoordinator, SignalHandler};
use vcr_sync::SyncError;

mod commands;
mod config;
mod output;

use commands::{bootstrap, refresh, sync, verify, Context, Outcome};

/// vcr-sync - replicator cluster topology management
#[derive(Parser)]
#[command(name = "vcr-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VCR_SYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table", global = true)]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, env = "VCR_SYNC_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write Prometheus metrics to this file when the command finishes
    #[arg(long, value_name = "PATH", global = true)]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a replicator cluster
    Bootstrap(bootstrap::BootstrapArgs),

    /// Add resources and partitions the replicator cluster lacks
    #[command(alias = "reconcile")]
    Sync(sync::SyncArgs),

    /// Re-apply the configured replication policy to existing resources
    Refresh(refresh::RefreshArgs),

    /// Report source partitions missing from the replicator cluster
    Verify(verify::VerifyArgs),

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    if let Commands::Completion { shell } = cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        clap_complete::generate(shell, &mut cmd, "vcr-sync", &mut std::io::stdout());
        return Ok(());
    }

    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    vcr_sync::observability::init(level, cli.json_logs)?;

    let metrics = match cli.metrics_file {
        Some(_) => Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install metrics recorder")?,
        ),
        None => None,
    };

    let shutdown = ShutdownCoordinator::new();
    let signals = SignalHandler::new(shutdown.clone());
    tokio::spawn(async move {
        if let Err(e) = signals.run().await {
            tracing::warn!(error = %e, "Signal handler failed");
        }
    });

    let result = run(cli.command, cli.config.as_deref(), cli.output, shutdown).await;

    if let (Some(path), Some(handle)) = (&cli.metrics_file, &metrics) {
        if let Err(e) = write_metrics(path, handle) {
            output::warning(format!("{:#}", e));
        }
    }

    let code = match result {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            if cli.verbose {
                eprintln!("{:?}", e);
            } else {
                output::error(format!("{:#}", e));
            }
            match e.downcast_ref::<SyncError>() {
                Some(SyncError::Cancelled) => Outcome::Cancelled.exit_code(),
                Some(err) if err.is_retryable() => {
                    output::warning("The cluster admin call may have failed transiently; rerunning is safe");
                    1
                }
                _ => 1,
            }
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

async fn run(
    command: Commands,
    config_path: Option<&Path>,
    format: output::OutputFormat,
    shutdown: ShutdownCoordinator,
) -> Result<Outcome> {
    let ctx = Context {
        config: config::load(config_path)?,
        format,
        shutdown,
    };

    match command {
        Commands::Bootstrap(args) => bootstrap::execute(args, &ctx).await,
        Commands::Sync(args) => sync::execute(args, &ctx).await,
        Commands::Refresh(args) => refresh::execute(args, &ctx).await,
        Commands::Verify(args) => verify::execute(args, &ctx).await,
        Commands::Completion { .. } => Ok(Outcome::Success),
    }
}

/// Write the rendered Prometheus exposition atomically.
fn write_metrics(path: &Path, handle: &PrometheusHandle) -> Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render())
        .with_context(|| format!("Failed to write metrics file: {:?}", tmp))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to write metrics file: {:?}", path))?;
    Ok(())
}
