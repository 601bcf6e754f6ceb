//! Policy refresh of an existing replicator cluster.
//!
//! Rewrites every non-ignored destination resource with the replication
//! policy from the current configuration. Partition sets are preserved
//! exactly; no source cluster is involved.

use crate::admin::ClusterAdmin;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::ideal_state::rebuild_policy;
use crate::metrics;
use crate::reconcile::pass::Pass;
use crate::reconcile::{Decision, Mutation};
use crate::report::{Operation, ReconcileReport, ResourceAction};
use crate::shutdown::ShutdownCoordinator;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs refresh passes.
#[derive(Clone, Default)]
pub struct Refresher {
    dry_run: bool,
    shutdown: ShutdownCoordinator,
}

impl Refresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownCoordinator) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Re-apply the configured policy to every resource of `cluster`.
    ///
    /// A resource whose stored policy already matches is reported unchanged
    /// and not rewritten. Read and write failures are per resource, as in
    /// [`Reconciler::reconcile`](crate::reconcile::Reconciler::reconcile).
    pub async fn refresh(
        &self,
        admin: &dyn ClusterAdmin,
        cluster: &str,
        config: &SyncConfig,
    ) -> Result<ReconcileReport> {
        let start = Instant::now();
        info!(cluster = %cluster, dry_run = self.dry_run, "Starting refresh pass");

        let report = match self.run(admin, cluster, config).await {
            Ok(report) => report,
            Err(e) => {
                metrics::record_aborted(Operation::Refresh, e.kind());
                return Err(e);
            }
        };

        metrics::record_pass(&report, start.elapsed().as_secs_f64());
        info!(cluster = %cluster, summary = %report.summary(), "Refresh pass finished");
        Ok(report)
    }

    async fn run(
        &self,
        admin: &dyn ClusterAdmin,
        cluster: &str,
        config: &SyncConfig,
    ) -> Result<ReconcileReport> {
        let resources = admin.list_resources(cluster).await?;
        debug!(cluster = %cluster, resources = resources.len(), "Enumerated resources");

        let mut pass = Pass::new(Operation::Refresh, None, admin, cluster, self.dry_run, &self.shutdown);
        for resource in &resources {
            if pass.stop_requested() {
                break;
            }
            match decide(admin, cluster, resource, config).await {
                Ok(decision) => pass.settle(resource, decision).await,
                Err(e) => pass.read_failed(resource, e)?,
            }
        }
        Ok(pass.finish())
    }
}

async fn decide(
    admin: &dyn ClusterAdmin,
    cluster: &str,
    resource: &str,
    config: &SyncConfig,
) -> Result<Decision> {
    if let Some(keyword) = config.ignore.matching_keyword(resource) {
        debug!(resource = %resource, keyword = %keyword, "Ignoring resource");
        return Ok(Decision::Record(ResourceAction::Ignored {
            keyword: keyword.to_string(),
        }));
    }

    let Some(current) = admin.get_ideal_state(cluster, resource).await? else {
        warn!(resource = %resource, "Resource vanished after enumeration");
        return Ok(Decision::Record(ResourceAction::Skipped {
            reason: "resource no longer exists".to_string(),
        }));
    };

    let ideal_state = rebuild_policy(&current, &config.ideal_state);
    if current.same_policy(&ideal_state) {
        return Ok(Decision::Record(ResourceAction::Unchanged {
            partitions: current.num_partitions(),
        }));
    }
    debug!(resource = %resource, policy = %ideal_state.rebalance, "Refreshing resource");
    Ok(Decision::Apply(Mutation::Refresh { ideal_state }))
}
