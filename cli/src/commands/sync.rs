//! Reconcile a replicator cluster against its source

use anyhow::{Context as _, Result};
use clap::Args;
use vcr_sync::admin::{ClusterAddress, FileClusterAdmin};
use vcr_sync::Reconciler;

use super::{Context, Outcome};
use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Source storage cluster, as <store>/<cluster>
    #[arg(long, value_name = "STORE/CLUSTER")]
    src: ClusterAddress,

    /// Replicator cluster to update, as <store>/<cluster>
    #[arg(long, value_name = "STORE/CLUSTER")]
    dest: ClusterAddress,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(args: SyncArgs, ctx: &Context) -> Result<Outcome> {
    let src = FileClusterAdmin::new(&args.src.store);
    let dest = FileClusterAdmin::new(&args.dest.store);

    let report = Reconciler::new()
        .dry_run(args.dry_run)
        .with_shutdown(ctx.shutdown.clone())
        .reconcile(&src, &args.src.cluster, &dest, &args.dest.cluster, &ctx.config)
        .await
        .with_context(|| format!("Failed to sync {} from {}", args.dest, args.src))?;

    output::print_report(&report, ctx.format)?;
    Ok(report.outcome().into())
}
