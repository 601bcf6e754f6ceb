//! Replicator cluster creation

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use vcr_sync::admin::{ClusterAddress, FileClusterAdmin};
use vcr_sync::{bootstrap, SyncError};

use super::{Context, Outcome};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct BootstrapArgs {
    /// Cluster to create, as <store>/<cluster>
    #[arg(long, value_name = "STORE/CLUSTER")]
    dest: ClusterAddress,
}

#[derive(Debug, Serialize)]
struct BootstrapResult<'a> {
    cluster: &'a str,
    store: String,
    created: bool,
}

pub async fn execute(args: BootstrapArgs, ctx: &Context) -> Result<Outcome> {
    if ctx.shutdown.is_shutting_down() {
        return Err(SyncError::Cancelled.into());
    }

    let admin = FileClusterAdmin::new(&args.dest.store);
    bootstrap::create_cluster(&admin, &args.dest.cluster, &ctx.config)
        .await
        .with_context(|| format!("Failed to create cluster {}", args.dest))?;

    match ctx.format {
        OutputFormat::Table => {
            output::success(format!("Created cluster {}", args.dest));
            let settings = &ctx.config.cluster;
            if let Some(v) = settings.max_offline_instances_allowed {
                output::print_kv("Max offline instances", v);
            }
            if let Some(v) = settings.num_offline_instances_for_auto_exit {
                output::print_kv("Offline instances for auto exit", v);
            }
            if let Some(v) = settings.allow_auto_join {
                output::print_kv("Allow auto join", v);
            }
        }
        format => output::print_single(
            &BootstrapResult {
                cluster: &args.dest.cluster,
                store: args.dest.store.display().to_string(),
                created: true,
            },
            format,
        )?,
    }
    Ok(Outcome::Success)
}
