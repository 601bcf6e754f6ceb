//! Per-resource decisions and their application.
//!
//! A pass handles one resource at a time: read, decide, write, then move on
//! to the next. A failed read or write is recorded against its resource and
//! the pass continues. In a dry run nothing is written, so a failed read
//! leaves nothing to report and aborts the pass instead.

use crate::admin::ClusterAdmin;
use crate::error::{Result, SyncError};
use crate::metrics;
use crate::report::{Operation, ReconcileReport, ResourceAction};
use crate::shutdown::ShutdownCoordinator;
use crate::types::{IdealStateDescriptor, PartitionSet};
use tracing::{info, warn};

/// A change to one destination resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Add a resource missing from the destination.
    Create { ideal_state: IdealStateDescriptor },
    /// Rewrite a resource over the union of its partitions and `added`.
    Expand {
        ideal_state: IdealStateDescriptor,
        added: PartitionSet,
    },
    /// Rewrite a resource's policy over its unchanged partitions.
    Refresh { ideal_state: IdealStateDescriptor },
}

impl Mutation {
    pub fn ideal_state(&self) -> &IdealStateDescriptor {
        match self {
            Mutation::Create { ideal_state }
            | Mutation::Expand { ideal_state, .. }
            | Mutation::Refresh { ideal_state } => ideal_state,
        }
    }

    pub fn resource(&self) -> &str {
        &self.ideal_state().resource
    }

    /// The action reported once this mutation is applied (or would be).
    pub fn action(&self) -> ResourceAction {
        let partitions = self.ideal_state().num_partitions();
        match self {
            Mutation::Create { .. } => ResourceAction::Created { partitions },
            Mutation::Expand { added, .. } => ResourceAction::Expanded {
                added: added.len(),
                partitions,
            },
            Mutation::Refresh { .. } => ResourceAction::Refreshed { partitions },
        }
    }

    async fn apply(&self, admin: &dyn ClusterAdmin, cluster: &str) -> Result<()> {
        let ideal_state = self.ideal_state();
        match self {
            Mutation::Create { .. } => admin.add_resource(cluster, self.resource(), ideal_state).await,
            Mutation::Expand { .. } | Mutation::Refresh { .. } => {
                admin.update_ideal_state(cluster, self.resource(), ideal_state).await
            }
        }
    }
}

/// What a pass decided for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Apply a mutation.
    Apply(Mutation),
    /// Nothing to write; report this action as-is.
    Record(ResourceAction),
}

/// One reconcile or refresh pass over a destination cluster.
pub(crate) struct Pass<'a> {
    admin: &'a dyn ClusterAdmin,
    cluster: &'a str,
    dry_run: bool,
    shutdown: &'a ShutdownCoordinator,
    report: ReconcileReport,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(
        operation: Operation,
        source_cluster: Option<&str>,
        admin: &'a dyn ClusterAdmin,
        cluster: &'a str,
        dry_run: bool,
        shutdown: &'a ShutdownCoordinator,
    ) -> Self {
        Self {
            admin,
            cluster,
            dry_run,
            shutdown,
            report: ReconcileReport::new(operation, source_cluster, cluster, dry_run),
        }
    }

    /// Whether the pass must stop before the next resource.
    pub(crate) fn stop_requested(&mut self) -> bool {
        if self.shutdown.is_shutting_down() {
            warn!(
                cluster = %self.cluster,
                processed = self.report.resources.len(),
                "Cancelled between resources"
            );
            self.report.cancelled = true;
        }
        self.report.cancelled
    }

    /// Record a failure to decide what `resource` needs.
    ///
    /// Returns the error when it aborts the pass: in a dry run, or when the
    /// error is not scoped to the resource.
    pub(crate) fn read_failed(&mut self, resource: &str, error: SyncError) -> Result<()> {
        if self.dry_run || error.is_fatal() {
            return Err(error);
        }
        warn!(cluster = %self.cluster, resource = %resource, error = %error, "Failed to read resource");
        metrics::record_error(error.kind());
        self.report.record(resource, ResourceAction::Failed {
            error: error.to_string(),
        });
        Ok(())
    }

    /// Apply or record the decision for `resource`.
    pub(crate) async fn settle(&mut self, resource: &str, decision: Decision) {
        let mutation = match decision {
            Decision::Record(action) => {
                self.report.record(resource, action);
                return;
            }
            Decision::Apply(mutation) => mutation,
        };

        let action = mutation.action();
        if self.dry_run {
            info!(cluster = %self.cluster, resource = %resource, action = %action, "Dry run, not applying");
            self.report.record(resource, action);
            return;
        }

        match mutation.apply(self.admin, self.cluster).await {
            Ok(()) => {
                info!(cluster = %self.cluster, resource = %resource, action = %action, "Applied mutation");
                self.report.record(resource, action);
            }
            Err(e) => {
                warn!(cluster = %self.cluster, resource = %resource, error = %e, "Failed to apply mutation");
                metrics::record_error(e.kind());
                self.report.record(resource, ResourceAction::Failed { error: e.to_string() });
            }
        }
    }

    pub(crate) fn finish(mut self) -> ReconcileReport {
        self.report.finish();
        self.report
    }
}
