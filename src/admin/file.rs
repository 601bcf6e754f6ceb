//! Cluster admin persisted as JSON documents on disk.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<cluster>/cluster.json                 cluster settings
//! <root>/<cluster>/idealstates/<resource>.json  one ideal state per resource
//! ```
//!
//! Each ideal state is written to a temporary file and renamed into place,
//! so a resource's mutation is atomic with respect to readers.

use super::ClusterAdmin;
use crate::config::ClusterConfig;
use crate::error::{AdminOp, Result, SyncError};
use crate::types::IdealStateDescriptor;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const CLUSTER_FILE: &str = "cluster.json";
const IDEAL_STATE_DIR: &str = "idealstates";

/// File-backed cluster admin rooted at a directory.
pub struct FileClusterAdmin {
    root: PathBuf,
}

impl FileClusterAdmin {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn cluster_dir(&self, cluster: &str) -> PathBuf {
        self.root.join(cluster)
    }

    fn ideal_state_path(&self, cluster: &str, resource: &str) -> PathBuf {
        self.cluster_dir(cluster)
            .join(IDEAL_STATE_DIR)
            .join(format!("{}.json", resource))
    }

    async fn require_cluster(&self, op: AdminOp, cluster: &str, resource: Option<&str>) -> Result<()> {
        let path = self.cluster_dir(cluster).join(CLUSTER_FILE);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SyncError::admin(op, cluster, resource, "cluster does not exist")),
            Err(e) => Err(SyncError::admin(op, cluster, resource, e)),
        }
    }

    async fn write_ideal_state(
        &self,
        op: AdminOp,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()> {
        let path = self.ideal_state_path(cluster, resource);
        let data = serde_json::to_vec_pretty(ideal_state)?;
        write_atomic(&path, &data)
            .await
            .map_err(|e| SyncError::admin(op, cluster, Some(resource), e))?;
        debug!(cluster = %cluster, resource = %resource, path = %path.display(), "Wrote ideal state");
        Ok(())
    }
}

/// Reject names that would escape the cluster directory.
fn check_name(op: AdminOp, cluster: &str, resource: Option<&str>) -> Result<()> {
    let bad = |name: &str| {
        name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\'])
    };
    if bad(cluster) {
        return Err(SyncError::admin(op, cluster, resource, "invalid cluster name"));
    }
    if resource.map_or(false, bad) {
        return Err(SyncError::admin(op, cluster, resource, "invalid resource name"));
    }
    Ok(())
}

async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
    }
    tokio::fs::rename(&tmp_path, path).await
}

#[async_trait::async_trait]
impl ClusterAdmin for FileClusterAdmin {
    async fn list_resources(&self, cluster: &str) -> Result<BTreeSet<String>> {
        let op = AdminOp::ListResources;
        check_name(op, cluster, None)?;
        self.require_cluster(op, cluster, None).await?;

        let dir = self.cluster_dir(cluster).join(IDEAL_STATE_DIR);
        let mut resources = BTreeSet::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(resources),
            Err(e) => return Err(SyncError::admin(op, cluster, None, e)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::admin(op, cluster, None, e))?
        {
            let file_name = entry.file_name();
            if let Some(resource) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) {
                resources.insert(resource.to_string());
            }
        }
        Ok(resources)
    }

    async fn get_ideal_state(
        &self,
        cluster: &str,
        resource: &str,
    ) -> Result<Option<IdealStateDescriptor>> {
        let op = AdminOp::GetIdealState;
        check_name(op, cluster, Some(resource))?;
        self.require_cluster(op, cluster, Some(resource)).await?;

        let path = self.ideal_state_path(cluster, resource);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::admin(op, cluster, Some(resource), e)),
        };
        let ideal_state = serde_json::from_slice(&data)
            .map_err(|e| SyncError::admin(op, cluster, Some(resource), e))?;
        Ok(Some(ideal_state))
    }

    async fn add_resource(
        &self,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()> {
        let op = AdminOp::AddResource;
        check_name(op, cluster, Some(resource))?;
        self.require_cluster(op, cluster, Some(resource)).await?;

        let exists = tokio::fs::try_exists(self.ideal_state_path(cluster, resource))
            .await
            .map_err(|e| SyncError::admin(op, cluster, Some(resource), e))?;
        if exists {
            return Err(SyncError::admin(op, cluster, Some(resource), "resource already exists"));
        }
        self.write_ideal_state(op, cluster, resource, ideal_state).await
    }

    async fn update_ideal_state(
        &self,
        cluster: &str,
        resource: &str,
        ideal_state: &IdealStateDescriptor,
    ) -> Result<()> {
        let op = AdminOp::UpdateIdealState;
        check_name(op, cluster, Some(resource))?;
        self.require_cluster(op, cluster, Some(resource)).await?;

        let exists = tokio::fs::try_exists(self.ideal_state_path(cluster, resource))
            .await
            .map_err(|e| SyncError::admin(op, cluster, Some(resource), e))?;
        if !exists {
            return Err(SyncError::NotFound {
                cluster: cluster.to_string(),
                resource: resource.to_string(),
            });
        }
        self.write_ideal_state(op, cluster, resource, ideal_state).await
    }

    async fn create_cluster(&self, cluster: &str, config: &ClusterConfig) -> Result<()> {
        let op = AdminOp::CreateCluster;
        check_name(op, cluster, None)?;
        if self.cluster_exists(cluster).await? {
            return Err(SyncError::admin(op, cluster, None, "cluster already exists"));
        }

        let dir = self.cluster_dir(cluster);
        tokio::fs::create_dir_all(dir.join(IDEAL_STATE_DIR))
            .await
            .map_err(|e| SyncError::admin(op, cluster, None, e))?;
        let data = serde_json::to_vec_pretty(config)?;
        write_atomic(&dir.join(CLUSTER_FILE), &data)
            .await
            .map_err(|e| SyncError::admin(op, cluster, None, e))?;
        debug!(cluster = %cluster, root = %self.root.display(), "Created cluster directory");
        Ok(())
    }

    async fn cluster_exists(&self, cluster: &str) -> Result<bool> {
        let op = AdminOp::ClusterExists;
        check_name(op, cluster, None)?;
        tokio::fs::try_exists(self.cluster_dir(cluster).join(CLUSTER_FILE))
            .await
            .map_err(|e| SyncError::admin(op, cluster, None, e))
    }
}
