//! Common test utilities for integration tests.

pub mod fixtures;

pub use fixtures::*;

use vcr_sync::admin::{ClusterAdmin, MemoryClusterAdmin};
use vcr_sync::config::{ClusterConfig, SyncConfig};
use vcr_sync::ideal_state::build_ideal_state;
use vcr_sync::PartitionSet;

pub const SRC_CLUSTER: &str = "srcCluster";
pub const DEST_CLUSTER: &str = "DEST_VCR_CLUSTER1";

/// Partition ids `"0"..="n-1"`.
pub fn partition_range(range: std::ops::Range<u32>) -> PartitionSet {
    range.map(|i| i.to_string()).collect()
}

/// Source and destination admins with both clusters created.
pub struct TestClusters {
    pub src: MemoryClusterAdmin,
    pub dest: MemoryClusterAdmin,
}

impl TestClusters {
    pub async fn new() -> Self {
        let src = MemoryClusterAdmin::new();
        src.create_cluster(SRC_CLUSTER, &ClusterConfig::default())
            .await
            .expect("create source cluster");
        let dest = MemoryClusterAdmin::new();
        dest.create_cluster(DEST_CLUSTER, &ClusterConfig::default())
            .await
            .expect("create destination cluster");
        Self { src, dest }
    }

    /// Put `resource` in the source cluster with `partitions`.
    pub async fn seed_source(&self, resource: &str, partitions: PartitionSet, config: &SyncConfig) {
        self.src
            .put_resource(SRC_CLUSTER, build_ideal_state(resource, partitions, &config.ideal_state))
            .await;
    }

    /// Destination partitions of `resource`, if it exists.
    pub async fn dest_partitions(&self, resource: &str) -> Option<PartitionSet> {
        self.dest
            .get_ideal_state(DEST_CLUSTER, resource)
            .await
            .expect("read destination")
            .map(|desc| desc.partitions)
    }
}

/// Both shipped configuration documents, parsed.
pub fn all_configs() -> Vec<(&'static str, SyncConfig)> {
    vec![
        ("crush_ed", SyncConfig::parse(CRUSH_ED_CONFIG).expect("parse full-auto config")),
        ("delayed", SyncConfig::parse(DELAYED_CONFIG).expect("parse delayed config")),
    ]
}
