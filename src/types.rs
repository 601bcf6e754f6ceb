//! Core types shared by the topology operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of partition identifiers.
///
/// Partitions are opaque strings. A `BTreeSet` gives set semantics and a
/// stable iteration order, so descriptors built from the same partitions
/// always compare and serialize identically.
pub type PartitionSet = BTreeSet<String>;

/// How the coordination service places replicas of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RebalanceMode {
    /// Replicas are reassigned as soon as membership changes.
    FullAuto {
        /// Placement algorithm identifier.
        strategy: String,
    },
    /// Replica reassignment is postponed after a replica loss.
    DelayedAuto {
        /// Rebalancer implementation that enables delayed rebalancing.
        rebalancer_class: String,
        /// Placement algorithm used once rebalancing happens, if configured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<String>,
        /// Replicas that must stay active before the delay applies.
        min_active_replicas: u32,
        /// How long to wait after a replica loss.
        delay_minutes: u64,
    },
}

impl RebalanceMode {
    pub fn is_delayed(&self) -> bool {
        matches!(self, RebalanceMode::DelayedAuto { .. })
    }

    /// Rebalance delay in milliseconds, as coordination services store it.
    pub fn delay_millis(&self) -> Option<u64> {
        match self {
            RebalanceMode::FullAuto { .. } => None,
            RebalanceMode::DelayedAuto { delay_minutes, .. } => {
                Some(delay_minutes.saturating_mul(60 * 1000))
            }
        }
    }
}

impl fmt::Display for RebalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceMode::FullAuto { strategy } => write!(f, "full-auto({})", strategy),
            RebalanceMode::DelayedAuto {
                rebalancer_class,
                min_active_replicas,
                delay_minutes,
                ..
            } => write!(
                f,
                "delayed-auto({}, min_active={}, delay={}m)",
                rebalancer_class, min_active_replicas, delay_minutes
            ),
        }
    }
}

/// Declarative description of one resource in a cluster.
///
/// Partitions carry no node assignment; placement is left to the
/// coordination service's rebalancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdealStateDescriptor {
    /// Resource name.
    pub resource: String,
    /// Partitions registered under the resource.
    pub partitions: PartitionSet,
    /// Replicas per partition.
    pub replica_count: u32,
    /// State-transition model reference (e.g. `OnlineOffline`).
    pub state_model: String,
    /// Rebalance policy.
    pub rebalance: RebalanceMode,
}

impl IdealStateDescriptor {
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Partitions of `other` that this descriptor does not contain.
    pub fn missing_from(&self, other: &PartitionSet) -> PartitionSet {
        other.difference(&self.partitions).cloned().collect()
    }

    /// Whether the replication policy (everything except partitions) matches.
    pub fn same_policy(&self, other: &IdealStateDescriptor) -> bool {
        self.replica_count == other.replica_count
            && self.state_model == other.state_model
            && self.rebalance == other.rebalance
    }
}
