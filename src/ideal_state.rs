//! Ideal-state construction.

use crate::config::IdealStateConfig;
use crate::types::{IdealStateDescriptor, PartitionSet};

/// Build the ideal state for `resource` over `partitions`.
///
/// Every partition is registered with no node assignment. Duplicate
/// partitions collapse and input order is irrelevant. The rebalance mode is
/// taken from `config` as-is.
pub fn build_ideal_state<I, S>(
    resource: &str,
    partitions: I,
    config: &IdealStateConfig,
) -> IdealStateDescriptor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let partitions: PartitionSet = partitions.into_iter().map(Into::into).collect();

    IdealStateDescriptor {
        resource: resource.to_string(),
        partitions,
        replica_count: config.replica_count,
        state_model: config.state_model.clone(),
        rebalance: config.rebalance.clone(),
    }
}

/// Rebuild `current` with the policy from `config`, keeping its partitions.
pub fn rebuild_policy(current: &IdealStateDescriptor, config: &IdealStateConfig) -> IdealStateDescriptor {
    build_ideal_state(&current.resource, current.partitions.iter().cloned(), config)
}
