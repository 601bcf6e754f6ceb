//! Re-apply the configured replication policy

use anyhow::{Context as _, Result};
use clap::Args;
use vcr_sync::admin::{ClusterAddress, FileClusterAdmin};
use vcr_sync::Refresher;

use super::{Context, Outcome};
use crate::output;

#[derive(Args)]
pub struct RefreshArgs {
    /// Replicator cluster to refresh, as <store>/<cluster>
    #[arg(long, value_name = "STORE/CLUSTER")]
    dest: ClusterAddress,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(args: RefreshArgs, ctx: &Context) -> Result<Outcome> {
    let admin = FileClusterAdmin::new(&args.dest.store);

    let report = Refresher::new()
        .dry_run(args.dry_run)
        .with_shutdown(ctx.shutdown.clone())
        .refresh(&admin, &args.dest.cluster, &ctx.config)
        .await
        .with_context(|| format!("Failed to refresh {}", args.dest))?;

    output::print_report(&report, ctx.format)?;
    Ok(report.outcome().into())
}
