//! Drift check

use anyhow::{Context as _, Result};
use clap::Args;
use vcr_sync::admin::{ClusterAddress, FileClusterAdmin};
use vcr_sync::verify;

use super::{Context, Outcome};
use crate::output;

#[derive(Args)]
pub struct VerifyArgs {
    /// Source storage cluster, as <store>/<cluster>
    #[arg(long, value_name = "STORE/CLUSTER")]
    src: ClusterAddress,

    /// Replicator cluster to check, as <store>/<cluster>
    #[arg(long, value_name = "STORE/CLUSTER")]
    dest: ClusterAddress,
}

pub async fn execute(args: VerifyArgs, ctx: &Context) -> Result<Outcome> {
    let src = FileClusterAdmin::new(&args.src.store);
    let dest = FileClusterAdmin::new(&args.dest.store);

    let status = verify::check_sync(
        &src,
        &args.src.cluster,
        &dest,
        &args.dest.cluster,
        &ctx.config.ignore,
    )
    .await
    .with_context(|| format!("Failed to verify {} against {}", args.dest, args.src))?;

    output::print_status(&status, ctx.format)?;
    Ok(if status.in_sync() { Outcome::Success } else { Outcome::Drift })
}
