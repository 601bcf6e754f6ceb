//! In-memory cluster admin.

use super::ClusterAdmin;
use crate::config::ClusterConfig;
use crate::error::{AdminOp, Result, SyncError};
use crate::types::IdealStateDescriptor;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct ClusterState {
    config: ClusterConfig,
    resources: BTreeMap<String, IdealStateDescriptor>,
}

/// Failures to inject into a [`MemoryClusterAdmin`].
///
/// A fault either targets an operation on one resource or the operation on
/// every resource.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: HashSet<(AdminOp, Option<String>)>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `op` for every resource.
    pub fn fail(mut self, op: AdminOp) -> Self {
        self.faults.insert((op, None));
        self
    }

    /// Fail `op` only when it targets `resource`.
    pub fn fail_resource(mut self, op: AdminOp, resource: impl Into<String>) -> Self {
        self.faults.insert((op, Some(resource.into())));
        self
    }

    fn triggers(&self, op: AdminOp, resource: Option<&str>) -> bool {
        self.faults.contains(&(op, None))
            || resource.map_or(false, |r| self.faults.contains(&(op, Some(r.to_string()))))
    }
}

/// Cluster admin backed by an in-memory map.
///
/// Mirrors the write semantics of a coordination service: adding an existing
/// resource, updating a missing one and creating an existing cluster all
/// fail.
pub struct MemoryClusterAdmin {
    clusters: RwLock<HashMap<String, ClusterState>>,
    faults: RwLock<FaultPlan>,
    writes: AtomicUsize,
}

impl MemoryClusterAdmin {
    pub fn new() -> Self {
        Self {
            clusters: RwLock::new(HashMap::new()),
            faults: RwLock::new(FaultPlan::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Replace the injected faults.
    pub async fn set_faults(&self, plan: FaultPlan) {
        *self.faults.write().await = plan;
    }

    pub async fn clear_faults(&self) {
        *self.faults.write().await = FaultPlan::new();
    }

    /// Number of successful mutations applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store `ideal_state` directly, creating the cluster if needed.
    ///
    /// Seeds source clusters in tests; bypasses faults and write counting.
    pub async fn put_resource(&self, cluster: &str, ideal_state: IdealStateDescriptor) {
        self.clusters
            .write()
            .await
            .entry(cluster.to_string())
            .or_default()
            .resources
            .insert(ideal_state.resource.clone(), ideal_state);
    }

    /// Remove a resource, returning whether it existed.
    pub async fn drop_resource(&self, cluster: &str, resource: &str) -> bool {
        self.clusters
            .write()
            .await
            .get_mut(cluster)
            .map_or(false, |state| state.resources.remove(resource).is_some())
    }

    /// Copy of every ideal state in `cluster`.
    pub async fn snapshot(&self, cluster: &str) -> BTreeMap<String, IdealStateDescriptor> {
        self.clusters
            .read()
            .await
            .get(cluster)
            .map(|state| state.resources.clone())
            .unwrap_or_default()
    }

    /// The settings `cluster` was created with.
    pub async fn cluster_config(&self, cluster: &str) -> Option<ClusterConfig> {
        self.clusters
            .read()
            .await
            .get(cluster)
            .map(|state| state.config.clone())
    }

    async fn check_fault(&self, op: AdminOp, cluster: &str, resource: Option<&str>) -> Result<()> {
        if self.faults.read().await.triggers(op, resource) {
            return Err(SyncError::admin(op, cluster, resource, "injected fault"));
        }
        Ok(())
    }
}

impl Default for MemoryClusterAdmin {
    fn default() -> Self {
        Self::new()
    }
}

fn no_cluster(op: AdminOp, cluster: &str, resource: Option<&str>) -> SyncError {
    SyncError::admin(op, cluster, resource, "cluster does not exist")
}

#[async_trait::async_trait]
impl ClusterAdmin for MemoryClusterAdmin {
    async fn list_resources(&self, cluster: &str) -> Result<BTreeSet<String>> {
        self.check_fault(AdminOp::ListResources, cluster, None).await?;
        let clusters = self.clusters.read().await;
        let state = clusters
            .get(cluster)
            .ok_or_else(|| no_cluster(AdminOp::ListResources, cluster, None))?;
        Ok(state.resources.keys().cloned().collect())
    }

    async fn get_ideal_state(
        &self,
        cluster: &str,
        resource: &str,
    ) -> Result<Option<IdealStateDescriptor>> {
        self.check_fault(AdminOp::GetIdealState, cluster, Some(resource)).await?;
        let clusters = self.clusters.read().await;
        let state = clusters
            .get(cluster)
            .ok_or_else(|| no_cluster(AdminOp::GetIdealState, cluster, Some(resource)))?;
        Ok(state.resources.get(resource).cloned())
    }

    async fn add_resource(
        &self,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()> {
        self.check_fault(AdminOp::AddResource, cluster, Some(resource)).await?;
        let mut clusters = self.clusters.write().await;
        let state = clusters
            .get_mut(cluster)
            .ok_or_else(|| no_cluster(AdminOp::AddResource, cluster, Some(resource)))?;
        if state.resources.contains_key(resource) {
            return Err(SyncError::admin(
                AdminOp::AddResource,
                cluster,
                Some(resource),
                "resource already exists",
            ));
        }
        state.resources.insert(resource.to_string(), ideal_state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_ideal_state(
        &self,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()> {
        self.check_fault(AdminOp::UpdateIdealState, cluster, Some(resource)).await?;
        let mut clusters = self.clusters.write().await;
        let state = clusters
            .get_mut(cluster)
            .ok_or_else(|| no_cluster(AdminOp::UpdateIdealState, cluster, Some(resource)))?;
        match state.resources.get_mut(resource) {
            Some(existing) => {
                *existing = ideal_state.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(SyncError::NotFound {
                cluster: cluster.to_string(),
                resource: resource.to_string(),
            }),
        }
    }

    async fn create_cluster(&self, cluster: &str, config: &ClusterConfig) -> Result<()> {
        self.check_fault(AdminOp::CreateCluster, cluster, None).await?;
        let mut clusters = self.clusters.write().await;
        if clusters.contains_key(cluster) {
            return Err(SyncError::admin(
                AdminOp::CreateCluster,
                cluster,
                None,
                "cluster already exists",
            ));
        }
        clusters.insert(
            cluster.to_string(),
            ClusterState {
                config: config.clone(),
                resources: BTreeMap::new(),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cluster_exists(&self, cluster: &str) -> Result<bool> {
        self.check_fault(AdminOp::ClusterExists, cluster, None).await?;
        Ok(self.clusters.read().await.contains_key(cluster))
    }
}
