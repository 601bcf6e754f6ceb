//! Access to the cluster-coordination service.
//!
//! Every topology operation reads and writes cluster state through the
//! [`ClusterAdmin`] trait. Nothing is cached between calls: each read goes to
//! the backing store so a pass always works from a fresh view.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryClusterAdmin`]: in-memory map, used by tests and dry tooling.
//! - [`FileClusterAdmin`]: JSON documents under a root directory, one file per
//!   ideal state.

mod file;
mod memory;

pub use file::FileClusterAdmin;
pub use memory::{FaultPlan, MemoryClusterAdmin};

use crate::config::ClusterConfig;
use crate::error::{Result, SyncError};
use crate::types::IdealStateDescriptor;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Capability to read and write a coordination service's cluster state.
///
/// Implementations own their retry policy; callers treat each call as one
/// attempt.
#[async_trait::async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// Names of all resources in `cluster`.
    async fn list_resources(&self, cluster: &str) -> Result<BTreeSet<String>>;

    /// The stored ideal state of `resource`, or `None` if it does not exist.
    async fn get_ideal_state(
        &self,
        cluster: &str,
        resource: &str,
    ) -> Result<Option<IdealStateDescriptor>>;

    /// Register a new resource.
    async fn add_resource(
        &self,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()>;

    /// Replace the ideal state of an existing resource.
    async fn update_ideal_state(
        &self,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()>;

    /// Create a cluster definition.
    async fn create_cluster(&self, cluster: &str, config: &ClusterConfig) -> Result<()>;

    /// Whether `cluster` has been created.
    async fn cluster_exists(&self, cluster: &str) -> Result<bool>;
}

/// Location of a cluster: the store holding it and the cluster name.
///
/// Written as `<store>/<cluster>`, split at the last `/`, so stores that are
/// themselves paths (`/var/lib/vcr/state/vcr-cluster-1`) work unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAddress {
    /// Store location (a directory for [`FileClusterAdmin`]).
    pub store: PathBuf,
    /// Cluster name within the store.
    pub cluster: String,
}

impl FromStr for ClusterAddress {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let (store, cluster) = s
            .rsplit_once('/')
            .ok_or_else(|| SyncError::InvalidAddress(format!("{} (expected <store>/<cluster>)", s)))?;
        if store.is_empty() || cluster.is_empty() {
            return Err(SyncError::InvalidAddress(format!(
                "{} (store and cluster must both be non-empty)",
                s
            )));
        }
        Ok(Self {
            store: PathBuf::from(store),
            cluster: cluster.to_string(),
        })
    }
}

impl fmt::Display for ClusterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store.display(), self.cluster)
    }
}
