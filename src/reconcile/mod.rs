//! Topology reconciliation between a source cluster and a replicator cluster.
//!
//! Convergence is one-directional and additive. For every source resource
//! not excluded by the ignore set:
//!
//! - absent in the destination: the resource is created with the source
//!   partitions;
//! - present: partitions the destination lacks are added, and the resource is
//!   rewritten over the union of both sets;
//! - nothing missing: no mutation.
//!
//! Destination partitions and resources are never removed. The destination
//! drives replication jobs, and the source's bookkeeping can be transiently
//! inconsistent (node restarts, resources dropped and recreated), so removing
//! anything could abandon in-flight or completed backups.
//!
//! After a pass without failures, every non-ignored source resource's
//! destination partition set is a superset of its source partition set.

pub mod pass;

pub use pass::{Decision, Mutation};

use crate::admin::ClusterAdmin;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::ideal_state::build_ideal_state;
use crate::metrics;
use crate::report::{Operation, ReconcileReport, ResourceAction};
use crate::shutdown::ShutdownCoordinator;
use crate::types::PartitionSet;
use pass::Pass;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs reconcile passes.
#[derive(Clone, Default)]
pub struct Reconciler {
    dry_run: bool,
    shutdown: ShutdownCoordinator,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and report mutations without applying them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stop between resources once `shutdown` is triggered.
    pub fn with_shutdown(mut self, shutdown: ShutdownCoordinator) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Bring `dest_cluster` up to date with `src_cluster`.
    ///
    /// Enumeration failures abort the pass. A resource whose ideal state
    /// cannot be read or written is reported failed and the pass moves on,
    /// except in a dry run, where a failed read aborts the pass.
    pub async fn reconcile(
        &self,
        src: &dyn ClusterAdmin,
        src_cluster: &str,
        dest: &dyn ClusterAdmin,
        dest_cluster: &str,
        config: &SyncConfig,
    ) -> Result<ReconcileReport> {
        let start = Instant::now();
        info!(
            src_cluster = %src_cluster,
            dest_cluster = %dest_cluster,
            dry_run = self.dry_run,
            "Starting reconcile pass"
        );

        let report = match self.run(src, src_cluster, dest, dest_cluster, config).await {
            Ok(report) => report,
            Err(e) => {
                metrics::record_aborted(Operation::Reconcile, e.kind());
                return Err(e);
            }
        };

        metrics::record_pass(&report, start.elapsed().as_secs_f64());
        info!(
            src_cluster = %src_cluster,
            dest_cluster = %dest_cluster,
            summary = %report.summary(),
            "Reconcile pass finished"
        );
        Ok(report)
    }

    async fn run(
        &self,
        src: &dyn ClusterAdmin,
        src_cluster: &str,
        dest: &dyn ClusterAdmin,
        dest_cluster: &str,
        config: &SyncConfig,
    ) -> Result<ReconcileReport> {
        let src_resources = src.list_resources(src_cluster).await?;
        let dest_resources = dest.list_resources(dest_cluster).await?;
        debug!(
            src_resources = src_resources.len(),
            dest_resources = dest_resources.len(),
            "Enumerated resources"
        );

        let mut pass = Pass::new(
            Operation::Reconcile,
            Some(src_cluster),
            dest,
            dest_cluster,
            self.dry_run,
            &self.shutdown,
        );
        for resource in &src_resources {
            if pass.stop_requested() {
                break;
            }
            let exists = dest_resources.contains(resource);
            match decide(src, src_cluster, dest, dest_cluster, exists, resource, config).await {
                Ok(decision) => pass.settle(resource, decision).await,
                Err(e) => pass.read_failed(resource, e)?,
            }
        }
        Ok(pass.finish())
    }
}

/// Decide what `resource` needs in the destination. Reads only.
async fn decide(
    src: &dyn ClusterAdmin,
    src_cluster: &str,
    dest: &dyn ClusterAdmin,
    dest_cluster: &str,
    in_destination: bool,
    resource: &str,
    config: &SyncConfig,
) -> Result<Decision> {
    if let Some(keyword) = config.ignore.matching_keyword(resource) {
        debug!(resource = %resource, keyword = %keyword, "Ignoring resource");
        return Ok(Decision::Record(ResourceAction::Ignored {
            keyword: keyword.to_string(),
        }));
    }

    let Some(source) = src.get_ideal_state(src_cluster, resource).await? else {
        warn!(resource = %resource, "Source resource vanished after enumeration");
        return Ok(Decision::Record(ResourceAction::Skipped {
            reason: "resource no longer exists in source".to_string(),
        }));
    };

    let current = if in_destination {
        dest.get_ideal_state(dest_cluster, resource).await?
    } else {
        None
    };

    let Some(current) = current else {
        debug!(resource = %resource, partitions = source.num_partitions(), "Creating resource");
        let ideal_state = build_ideal_state(resource, source.partitions, &config.ideal_state);
        return Ok(Decision::Apply(Mutation::Create { ideal_state }));
    };

    let missing: PartitionSet = current.missing_from(&source.partitions);
    if missing.is_empty() {
        return Ok(Decision::Record(ResourceAction::Unchanged {
            partitions: current.num_partitions(),
        }));
    }
    debug!(resource = %resource, missing = missing.len(), "Expanding resource");
    let union = current.partitions.iter().chain(missing.iter()).cloned();
    let ideal_state = build_ideal_state(resource, union, &config.ideal_state);
    Ok(Decision::Apply(Mutation::Expand {
        ideal_state,
        added: missing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{FaultPlan, MemoryClusterAdmin};
    use crate::config::{ClusterConfig, DelayedRebalancePolicy, IdealStateConfig};
    use crate::error::{AdminOp, SyncError};
    use crate::report::PassOutcome;
    use crate::types::IdealStateDescriptor;
    use std::collections::BTreeSet;

    const SRC: &str = "srcCluster";
    const DEST: &str = "DEST_VCR_CLUSTER1";

    fn config() -> SyncConfig {
        SyncConfig::new(IdealStateConfig::full_auto(2, "OnlineOffline", "CrushEd"))
    }

    fn partitions(range: std::ops::Range<u32>) -> Vec<String> {
        range.map(|i| i.to_string()).collect()
    }

    fn desc(resource: &str, parts: Vec<String>) -> IdealStateDescriptor {
        build_ideal_state(resource, parts, &config().ideal_state)
    }

    async fn clusters() -> (MemoryClusterAdmin, MemoryClusterAdmin) {
        let src = MemoryClusterAdmin::new();
        src.create_cluster(SRC, &ClusterConfig::default()).await.unwrap();
        let dest = MemoryClusterAdmin::new();
        dest.create_cluster(DEST, &ClusterConfig::default()).await.unwrap();
        (src, dest)
    }

    #[tokio::test]
    async fn test_creates_missing_resource() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..100))).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert_eq!(report.action_for("1"), Some(&ResourceAction::Created { partitions: 100 }));
        let stored = dest.get_ideal_state(DEST, "1").await.unwrap().unwrap();
        assert_eq!(stored.partitions, partitions(0..100).into_iter().collect());
    }

    #[tokio::test]
    async fn test_expands_without_dropping() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(50..120))).await;
        dest.put_resource(DEST, desc("1", partitions(0..100))).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert_eq!(
            report.action_for("1"),
            Some(&ResourceAction::Expanded { added: 20, partitions: 120 })
        );
        let stored = dest.get_ideal_state(DEST, "1").await.unwrap().unwrap();
        assert_eq!(stored.partitions, partitions(0..120).into_iter().collect());
    }

    #[tokio::test]
    async fn test_unchanged_when_superset() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..10))).await;
        dest.put_resource(DEST, desc("1", partitions(0..20))).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert_eq!(report.action_for("1"), Some(&ResourceAction::Unchanged { partitions: 20 }));
        assert_eq!(dest.write_count(), 1);
    }

    #[tokio::test]
    async fn test_ignored_and_destination_only_untouched() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("ambry-stats-report", partitions(0..1))).await;
        dest.put_resource(DEST, desc("dest-only", partitions(0..3))).await;
        dest.put_resource(DEST, desc("aggregation", partitions(0..1))).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert_eq!(
            report.action_for("ambry-stats-report"),
            Some(&ResourceAction::Ignored { keyword: "stats".to_string() })
        );
        assert_eq!(report.mutation_count(), 0);
        let snapshot = dest.snapshot(DEST).await;
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_key("ambry-stats-report"));
        assert_eq!(snapshot["dest-only"].num_partitions(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_writing() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..5))).await;

        let report = Reconciler::new()
            .dry_run(true)
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.action_for("1"), Some(&ResourceAction::Created { partitions: 5 }));
        assert!(dest.snapshot(DEST).await.is_empty());
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fatal() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..5))).await;
        src.set_faults(FaultPlan::new().fail(AdminOp::ListResources)).await;

        let err = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ClusterAdmin { op: AdminOp::ListResources, .. }));
        assert!(dest.snapshot(DEST).await.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_is_per_resource() {
        let (src, dest) = clusters().await;
        for name in ["1", "2", "3"] {
            src.put_resource(SRC, desc(name, partitions(0..5))).await;
        }
        src.set_faults(FaultPlan::new().fail_resource(AdminOp::GetIdealState, "2")).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert_eq!(report.outcome(), PassOutcome::PartialFailure);
        assert!(report.action_for("2").unwrap().is_failure());
        let snapshot = dest.snapshot(DEST).await;
        assert_eq!(snapshot["1"].num_partitions(), 5);
        assert_eq!(snapshot["3"].num_partitions(), 5);
        assert!(!snapshot.contains_key("2"));
    }

    #[tokio::test]
    async fn test_destination_read_failure_is_per_resource() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..5))).await;
        src.put_resource(SRC, desc("2", partitions(0..5))).await;
        dest.put_resource(DEST, desc("1", partitions(0..3))).await;
        dest.set_faults(FaultPlan::new().fail_resource(AdminOp::GetIdealState, "1")).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert!(report.action_for("1").unwrap().is_failure());
        assert_eq!(report.action_for("2"), Some(&ResourceAction::Created { partitions: 5 }));
    }

    #[tokio::test]
    async fn test_dry_run_read_failure_is_fatal() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..5))).await;
        src.set_faults(FaultPlan::new().fail_resource(AdminOp::GetIdealState, "1")).await;

        let err = Reconciler::new()
            .dry_run(true)
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ClusterAdmin { op: AdminOp::GetIdealState, .. }));
    }

    #[tokio::test]
    async fn test_write_failure_is_per_resource() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..5))).await;
        src.put_resource(SRC, desc("2", partitions(0..5))).await;
        dest.set_faults(FaultPlan::new().fail_resource(AdminOp::AddResource, "1")).await;

        let report = Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert!(report.action_for("1").unwrap().is_failure());
        assert_eq!(report.action_for("2"), Some(&ResourceAction::Created { partitions: 5 }));
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..5))).await;
        let shutdown = ShutdownCoordinator::new();
        shutdown.shutdown();

        let report = Reconciler::new()
            .with_shutdown(shutdown)
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.resources.is_empty());
        assert!(dest.snapshot(DEST).await.is_empty());
    }

    /// Triggers shutdown after its first successful resource creation.
    struct ShutdownAfterCreate {
        inner: MemoryClusterAdmin,
        shutdown: ShutdownCoordinator,
    }

    #[async_trait::async_trait]
    impl ClusterAdmin for ShutdownAfterCreate {
        async fn list_resources(&self, cluster: &str) -> Result<BTreeSet<String>> {
            self.inner.list_resources(cluster).await
        }

        async fn get_ideal_state(
            &self,
            cluster: &str,
            resource: &str,
        ) -> Result<Option<IdealStateDescriptor>> {
            self.inner.get_ideal_state(cluster, resource).await
        }

        async fn add_resource(
            &self,
            cluster: &str,
            resource: &str,
            ideal_state: &IdealStateDescriptor,
        ) -> Result<()> {
            self.inner.add_resource(cluster, resource, ideal_state).await?;
            self.shutdown.shutdown();
            Ok(())
        }

        async fn update_ideal_state(
            &self,
            cluster: &str,
            resource: &str,
            ideal_state: &IdealStateDescriptor,
        ) -> Result<()> {
            self.inner.update_ideal_state(cluster, resource, ideal_state).await
        }

        async fn create_cluster(&self, cluster: &str, config: &ClusterConfig) -> Result<()> {
            self.inner.create_cluster(cluster, config).await
        }

        async fn cluster_exists(&self, cluster: &str) -> Result<bool> {
            self.inner.cluster_exists(cluster).await
        }
    }

    #[tokio::test]
    async fn test_cancelled_mid_pass_keeps_processed() {
        let (src, inner) = clusters().await;
        for name in ["1", "2"] {
            src.put_resource(SRC, desc(name, partitions(0..5))).await;
        }
        let shutdown = ShutdownCoordinator::new();
        let dest = ShutdownAfterCreate {
            inner,
            shutdown: shutdown.clone(),
        };

        let report = Reconciler::new()
            .with_shutdown(shutdown)
            .reconcile(&src, SRC, &dest, DEST, &config())
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.outcome(), PassOutcome::Cancelled);
        assert_eq!(report.action_for("1"), Some(&ResourceAction::Created { partitions: 5 }));
        assert_eq!(report.action_for("2"), None);
        let snapshot = dest.inner.snapshot(DEST).await;
        assert!(snapshot.contains_key("1"));
        assert!(!snapshot.contains_key("2"));
    }

    #[tokio::test]
    async fn test_expand_applies_configured_policy() {
        let (src, dest) = clusters().await;
        src.put_resource(SRC, desc("1", partitions(0..3))).await;
        dest.put_resource(DEST, desc("1", partitions(0..2))).await;

        let delayed = SyncConfig::new(
            IdealStateConfig::full_auto(3, "OnlineOffline", "CrushEd").with_delayed(DelayedRebalancePolicy {
                rebalancer_class: "DelayedAutoRebalancer".to_string(),
                min_active_replicas: 1,
                delay_minutes: 20,
            }),
        );
        Reconciler::new()
            .reconcile(&src, SRC, &dest, DEST, &delayed)
            .await
            .unwrap();

        let stored = dest.get_ideal_state(DEST, "1").await.unwrap().unwrap();
        assert_eq!(stored.replica_count, 3);
        assert!(stored.rebalance.is_delayed());
    }
}
