//! Creation of a new destination cluster.

use crate::admin::ClusterAdmin;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::metrics;
use tracing::{error, info};

/// Create `cluster` with the cluster-level settings from `config`.
///
/// "Already exists" is not special-cased: whatever the admin reports is
/// returned to the caller.
pub async fn create_cluster(
    admin: &dyn ClusterAdmin,
    cluster: &str,
    config: &SyncConfig,
) -> Result<()> {
    let settings = &config.cluster;
    info!(
        cluster = %cluster,
        max_offline_instances_allowed = ?settings.max_offline_instances_allowed,
        num_offline_instances_for_auto_exit = ?settings.num_offline_instances_for_auto_exit,
        allow_auto_join = ?settings.allow_auto_join,
        "Creating cluster"
    );

    match admin.create_cluster(cluster, settings).await {
        Ok(()) => {
            metrics::record_bootstrap(true);
            info!(cluster = %cluster, "Cluster created");
            Ok(())
        }
        Err(e) => {
            metrics::record_bootstrap(false);
            metrics::record_error(e.kind());
            error!(cluster = %cluster, error = %e, "Cluster creation failed");
            Err(e)
        }
    }
}
