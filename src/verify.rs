//! Read-only convergence check between a source and a replicator cluster.

use crate::admin::ClusterAdmin;
use crate::error::Result;
use crate::ignore::IgnoreSet;
use crate::types::PartitionSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// What the destination lacks relative to the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Source resources with no destination counterpart.
    pub missing_resources: Vec<String>,
    /// Partitions absent from an existing destination resource.
    pub missing_partitions: BTreeMap<String, PartitionSet>,
    /// Source resources excluded by the ignore set.
    pub ignored: Vec<String>,
}

impl SyncStatus {
    pub fn in_sync(&self) -> bool {
        self.missing_resources.is_empty() && self.missing_partitions.is_empty()
    }

    /// Partitions missing from destination resources that exist.
    pub fn missing_partition_count(&self) -> usize {
        self.missing_partitions.values().map(|p| p.len()).sum()
    }
}

/// Compare every non-ignored source resource against the destination.
///
/// Extra destination resources and partitions are not drift.
pub async fn check_sync(
    src: &dyn ClusterAdmin,
    src_cluster: &str,
    dest: &dyn ClusterAdmin,
    dest_cluster: &str,
    ignore: &IgnoreSet,
) -> Result<SyncStatus> {
    let src_resources = src.list_resources(src_cluster).await?;
    let dest_resources = dest.list_resources(dest_cluster).await?;

    let mut status = SyncStatus::default();
    for resource in src_resources {
        if ignore.is_ignored(&resource) {
            status.ignored.push(resource);
            continue;
        }
        // Vanished since enumeration; nothing to compare.
        let Some(source) = src.get_ideal_state(src_cluster, &resource).await? else {
            continue;
        };

        let existing = if dest_resources.contains(&resource) {
            dest.get_ideal_state(dest_cluster, &resource).await?
        } else {
            None
        };

        match existing {
            None => {
                debug!(resource = %resource, "Missing from destination");
                status.missing_resources.push(resource);
            }
            Some(current) => {
                let missing = current.missing_from(&source.partitions);
                if !missing.is_empty() {
                    debug!(resource = %resource, missing = missing.len(), "Destination lacks partitions");
                    status.missing_partitions.insert(resource, missing);
                }
            }
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::MemoryClusterAdmin;
    use crate::config::IdealStateConfig;
    use crate::ideal_state::build_ideal_state;
    use crate::types::IdealStateDescriptor;

    fn desc(resource: &str, range: std::ops::Range<u32>) -> IdealStateDescriptor {
        let config = IdealStateConfig::full_auto(2, "OnlineOffline", "CrushEd");
        build_ideal_state(resource, range.map(|i| i.to_string()), &config)
    }

    #[tokio::test]
    async fn test_detects_drift() {
        let src = MemoryClusterAdmin::new();
        let dest = MemoryClusterAdmin::new();
        src.put_resource("src", desc("1", 0..10)).await;
        src.put_resource("src", desc("2", 0..3)).await;
        src.put_resource("src", desc("stats", 0..1)).await;
        dest.put_resource("dest", desc("1", 0..8)).await;

        let status = check_sync(&src, "src", &dest, "dest", &IgnoreSet::default())
            .await
            .unwrap();

        assert!(!status.in_sync());
        assert_eq!(status.missing_resources, vec!["2".to_string()]);
        assert_eq!(status.missing_partitions["1"].len(), 2);
        assert!(status.missing_partitions["1"].contains("9"));
        assert_eq!(status.ignored, vec!["stats".to_string()]);
        assert_eq!(status.missing_partition_count(), 2);
    }

    #[tokio::test]
    async fn test_superset_is_in_sync() {
        let src = MemoryClusterAdmin::new();
        let dest = MemoryClusterAdmin::new();
        src.put_resource("src", desc("1", 0..10)).await;
        dest.put_resource("dest", desc("1", 0..20)).await;
        dest.put_resource("dest", desc("extra", 0..2)).await;

        let status = check_sync(&src, "src", &dest, "dest", &IgnoreSet::default())
            .await
            .unwrap();
        assert!(status.in_sync());
    }
}
