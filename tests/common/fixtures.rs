// Test fixtures and topology generators for integration tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use vcr_sync::PartitionSet;

/// Full-auto placement with the CRUSH-ED strategy.
pub const CRUSH_ED_CONFIG: &str = r#"{
  "clusterConfigFields": {
    "maxOfflineInstancesAllowed": 4,
    "numOfflineInstancesForAutoExit": 2,
    "allowAutoJoin": true
  },
  "idealStateConfigFields": {
    "numReplicas": 2,
    "stateModelDefRef": "OnlineOffline",
    "rebalanceStrategy": "org.apache.helix.controller.rebalancer.strategy.CrushEdRebalanceStrategy"
  }
}"#;

/// Delayed rebalancing with a 20 minute delay.
pub const DELAYED_CONFIG: &str = r#"{
  "clusterConfigFields": {
    "maxOfflineInstancesAllowed": 4,
    "numOfflineInstancesForAutoExit": 2,
    "allowAutoJoin": true
  },
  "idealStateConfigFields": {
    "numReplicas": 2,
    "stateModelDefRef": "OnlineOffline",
    "rebalanceStrategy": "org.apache.helix.controller.rebalancer.strategy.CrushEdRebalanceStrategy",
    "minActiveReplicas": 0,
    "rebalancerClassName": "org.apache.helix.controller.rebalancer.DelayedAutoRebalancer",
    "rebalanceDelayInMins": 20
  }
}"#;

/// Same as [`CRUSH_ED_CONFIG`] without `numReplicas`.
pub const MISSING_REPLICAS_CONFIG: &str = r#"{
  "clusterConfigFields": {
    "maxOfflineInstancesAllowed": 4,
    "numOfflineInstancesForAutoExit": 2,
    "allowAutoJoin": true
  },
  "idealStateConfigFields": {
    "stateModelDefRef": "OnlineOffline",
    "rebalanceStrategy": "org.apache.helix.controller.rebalancer.strategy.CrushEdRebalanceStrategy"
  }
}"#;

/// Deterministic random topology generator for reproducible tests
pub struct TopologyGenerator {
    rng: StdRng,
}

impl TopologyGenerator {
    /// Creates a new generator with a fixed seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Random subset of partitions `0..max`
    pub fn partitions(&mut self, max: u32) -> PartitionSet {
        (0..max)
            .filter(|_| self.rng.gen_bool(0.6))
            .map(|i| i.to_string())
            .collect()
    }

    /// Random resource name, occasionally one matching a default ignore keyword
    pub fn resource_name(&mut self) -> String {
        match self.rng.gen_range(0..10) {
            0 => format!("stats-{}", self.rng.gen_range(0..100)),
            1 => format!("aggregation{}", self.rng.gen_range(0..100)),
            _ => self.rng.gen_range(0..20u32).to_string(),
        }
    }

    /// A random topology of up to `resources` resources
    pub fn topology(&mut self, resources: usize, max_partitions: u32) -> BTreeMap<String, PartitionSet> {
        (0..resources)
            .map(|_| (self.resource_name(), self.partitions(max_partitions)))
            .collect()
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }
}
