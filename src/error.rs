//! Error types for vcr-sync.
//!
//! This module provides a unified error type [`SyncError`] for all topology
//! operations, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Configuration**: malformed or incomplete sync configuration documents.
//!   Always fatal, raised before any cluster is contacted.
//! - **Cluster admin**: the coordination service rejected a read or write.
//!   Fatal for cluster-wide operations (bootstrap, enumeration); recorded per
//!   resource for reads and writes during a reconcile or refresh pass.
//! - **Not found**: a resource or cluster is absent where one was required.
//!
//! # Example
//!
//! ```rust
//! use vcr_sync::error::{AdminOp, SyncError};
//!
//! let err = SyncError::admin(AdminOp::ListResources, "vcr-cluster", None, "session expired");
//! assert!(err.is_fatal());
//! assert_eq!(err.kind(), "cluster_admin");
//! ```

use std::fmt;
use thiserror::Error;

/// Operations exposed by a cluster admin, used to label admin errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOp {
    ListResources,
    GetIdealState,
    AddResource,
    UpdateIdealState,
    CreateCluster,
    ClusterExists,
}

impl AdminOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminOp::ListResources => "list_resources",
            AdminOp::GetIdealState => "get_ideal_state",
            AdminOp::AddResource => "add_resource",
            AdminOp::UpdateIdealState => "update_ideal_state",
            AdminOp::CreateCluster => "create_cluster",
            AdminOp::ClusterExists => "cluster_exists",
        }
    }
}

impl fmt::Display for AdminOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for vcr-sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    // Configuration errors
    #[error("Invalid configuration: {field}: {reason}")]
    Config { field: String, reason: String },

    // Coordination service errors
    #[error("Cluster admin {op} failed on cluster {cluster}{}: {message}", fmt_resource(.resource))]
    ClusterAdmin {
        op: AdminOp,
        cluster: String,
        resource: Option<String>,
        message: String,
    },

    #[error("Resource not found: {resource} in cluster {cluster}")]
    NotFound { cluster: String, resource: String },

    #[error("Invalid cluster address: {0}")]
    InvalidAddress(String),

    #[error("Operation cancelled")]
    Cancelled,

    // External errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn fmt_resource(resource: &Option<String>) -> String {
    match resource {
        Some(r) => format!(" (resource {})", r),
        None => String::new(),
    }
}

impl SyncError {
    /// Build a configuration error for a document field.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a cluster admin error.
    pub fn admin(
        op: AdminOp,
        cluster: impl Into<String>,
        resource: Option<&str>,
        message: impl fmt::Display,
    ) -> Self {
        SyncError::ClusterAdmin {
            op,
            cluster: cluster.into(),
            resource: resource.map(str::to_string),
            message: message.to_string(),
        }
    }

    /// Whether this error aborts a whole run rather than a single resource.
    ///
    /// Admin errors scoped to one resource are recorded against it and the
    /// pass moves on. Cluster-wide admin errors (enumeration, cluster
    /// creation) and everything else abort.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::ClusterAdmin { resource, .. } => resource.is_none(),
            SyncError::NotFound { .. } => false,
            _ => true,
        }
    }

    /// Whether rerunning the same command may succeed.
    ///
    /// Coordination service failures are often transient, and every pass is
    /// safe to repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::ClusterAdmin { .. })
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Config { .. } => "config",
            SyncError::ClusterAdmin { .. } => "cluster_admin",
            SyncError::NotFound { .. } => "not_found",
            SyncError::InvalidAddress(_) => "invalid_address",
            SyncError::Cancelled => "cancelled",
            SyncError::Serialization(_) => "serialization",
            SyncError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for vcr-sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
