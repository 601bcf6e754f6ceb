//! vcr-sync - keeps a replicator cluster's partition topology in sync with
//! its source storage cluster.
//!
//! A storage cluster's partitions are grouped into resources, each described
//! by an ideal state held in a coordination service. A replicator (VCR)
//! cluster mirrors those resources so that its workers can take ownership of
//! partitions and copy them to backup storage. This crate computes and applies
//! the changes that keep the replicator's view current.
//!
//! # Operations
//!
//! - **Bootstrap**: create the replicator cluster with its cluster settings.
//! - **Reconcile**: add resources and partitions the replicator lacks.
//!   Never removes anything.
//! - **Refresh**: rewrite the replication policy of existing resources
//!   without touching their partitions.
//! - **Verify**: report drift without writing.
//!
//! All cluster access goes through the [`admin::ClusterAdmin`] trait.
//!
//! # Quick Start
//!
//! ```no_run
//! use vcr_sync::admin::FileClusterAdmin;
//! use vcr_sync::config::SyncConfig;
//! use vcr_sync::reconcile::Reconciler;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> vcr_sync::Result<()> {
//!     let config = SyncConfig::from_file(Path::new("vcr-sync.json"))?;
//!     let src = FileClusterAdmin::new("/var/lib/clusters/storage");
//!     let dest = FileClusterAdmin::new("/var/lib/clusters/vcr");
//!
//!     let report = Reconciler::new()
//!         .reconcile(&src, "ambry-prod", &dest, "vcr-prod", &config)
//!         .await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ideal_state;
pub mod ignore;
pub mod metrics;
pub mod observability;
pub mod reconcile;
pub mod refresh;
pub mod report;
pub mod shutdown;
pub mod types;
pub mod verify;

pub use admin::{ClusterAddress, ClusterAdmin};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use ignore::IgnoreSet;
pub use reconcile::Reconciler;
pub use refresh::Refresher;
pub use report::{ReconcileReport, ResourceAction};
pub use types::{IdealStateDescriptor, PartitionSet, RebalanceMode};
pub use verify::SyncStatus;
