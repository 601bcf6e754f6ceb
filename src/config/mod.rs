//! Configuration module for vcr-sync.
//!
//! A sync configuration is a JSON document with three sections:
//!
//! ```json
//! {
//!   "clusterConfigFields": {
//!     "maxOfflineInstancesAllowed": 4,
//!     "numOfflineInstancesForAutoExit": 2,
//!     "allowAutoJoin": true
//!   },
//!   "idealStateConfigFields": {
//!     "numReplicas": 2,
//!     "stateModelDefRef": "OnlineOffline",
//!     "rebalanceStrategy": "org.apache.helix.controller.rebalancer.strategy.CrushEdRebalanceStrategy"
//!   },
//!   "ignoreResourceKeyWords": ["aggregation", "trigger", "stats"]
//! }
//! ```
//!
//! The document is parsed into a [`SyncConfigDocument`] that mirrors the JSON
//! layout field for field, then validated into a [`SyncConfig`]. Serializing a
//! `SyncConfig` goes back through the document form, so a parsed config
//! re-serializes and re-parses to an equal value.

use crate::error::{Result, SyncError};
use crate::ignore::IgnoreSet;
use crate::types::RebalanceMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Minimum active replicas used when a delayed policy does not set one.
pub const DEFAULT_MIN_ACTIVE_REPLICAS: u32 = 0;

/// Rebalance delay used when a delayed policy does not set one.
pub const DEFAULT_REBALANCE_DELAY_MINS: u64 = 0;

/// Validated configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SyncConfigDocument", into = "SyncConfigDocument")]
pub struct SyncConfig {
    /// Settings applied when a cluster is created.
    pub cluster: ClusterConfig,
    /// Replication policy applied to every resource.
    pub ideal_state: IdealStateConfig,
    /// Resources excluded from every topology operation.
    pub ignore: IgnoreSet,
}

impl SyncConfig {
    /// Create a configuration with default cluster settings and ignore keywords.
    pub fn new(ideal_state: IdealStateConfig) -> Self {
        Self {
            cluster: ClusterConfig::default(),
            ideal_state,
            ignore: IgnoreSet::default(),
        }
    }

    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    /// Parse and validate a configuration document.
    pub fn parse(document: &str) -> Result<Self> {
        let doc: SyncConfigDocument = serde_json::from_str(document)
            .map_err(|e| SyncError::config("document", e.to_string()))?;
        Self::try_from(doc)
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(
                "document",
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;
        Self::parse(&content)
    }

    /// Render the configuration as a pretty-printed document.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Cluster-level settings, used only at cluster creation.
///
/// Every field is optional; an absent field leaves the coordination
/// service's default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterConfig {
    /// Offline instances tolerated before the cluster enters maintenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_offline_instances_allowed: Option<i32>,
    /// Offline count below which maintenance mode is exited automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_offline_instances_for_auto_exit: Option<i32>,
    /// Whether participants may join without being registered first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_auto_join: Option<bool>,
}

/// Replication policy applied to resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdealStateConfig {
    /// Replicas per partition. Always positive.
    pub replica_count: u32,
    /// State-transition model reference.
    pub state_model: String,
    /// Rebalance policy stamped on every descriptor.
    pub rebalance: RebalanceMode,
}

impl IdealStateConfig {
    /// Full-auto policy using `strategy` for placement.
    pub fn full_auto(
        replica_count: u32,
        state_model: impl Into<String>,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            replica_count,
            state_model: state_model.into(),
            rebalance: RebalanceMode::FullAuto {
                strategy: strategy.into(),
            },
        }
    }

    /// Switch to delayed rebalancing, keeping the placement strategy.
    pub fn with_delayed(mut self, delayed: DelayedRebalancePolicy) -> Self {
        let strategy = match self.rebalance {
            RebalanceMode::FullAuto { strategy } => Some(strategy),
            RebalanceMode::DelayedAuto { strategy, .. } => strategy,
        };
        self.rebalance = delayed.into_mode(strategy);
        self
    }
}

/// Settings for delayed auto-rebalance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedRebalancePolicy {
    /// Rebalancer implementation enabling delayed rebalancing.
    pub rebalancer_class: String,
    /// Minimum replicas required before delay logic applies.
    pub min_active_replicas: u32,
    /// Minutes to wait before rebalancing after a replica loss.
    pub delay_minutes: u64,
}

impl DelayedRebalancePolicy {
    fn into_mode(self, strategy: Option<String>) -> RebalanceMode {
        RebalanceMode::DelayedAuto {
            rebalancer_class: self.rebalancer_class,
            strategy,
            min_active_replicas: self.min_active_replicas,
            delay_minutes: self.delay_minutes,
        }
    }
}

/// Field-for-field mirror of the JSON configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SyncConfigDocument {
    #[serde(default)]
    pub cluster_config_fields: ClusterConfig,
    #[serde(default)]
    pub ideal_state_config_fields: Option<IdealStateConfigFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_resource_key_words: Option<Vec<String>>,
}

/// The `idealStateConfigFields` section.
///
/// Integers are read signed so that out-of-range values are reported against
/// their field rather than as a generic type error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdealStateConfigFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_model_def_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebalance_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebalancer_class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_active_replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebalance_delay_in_mins: Option<i64>,
}

const IDEAL_STATE: &str = "idealStateConfigFields";

fn field(name: &str) -> String {
    format!("{}.{}", IDEAL_STATE, name)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<IdealStateConfigFields> for IdealStateConfig {
    type Error = SyncError;

    fn try_from(fields: IdealStateConfigFields) -> Result<Self> {
        let replicas = fields
            .num_replicas
            .ok_or_else(|| SyncError::config(field("numReplicas"), "missing required field"))?;
        let replica_count = u32::try_from(replicas)
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| {
                SyncError::config(
                    field("numReplicas"),
                    format!("must be a positive integer, got {}", replicas),
                )
            })?;

        let state_model = non_blank(fields.state_model_def_ref).ok_or_else(|| {
            SyncError::config(field("stateModelDefRef"), "missing required field")
        })?;

        let rebalance_strategy = non_blank(fields.rebalance_strategy);
        let rebalancer_class = non_blank(fields.rebalancer_class_name);

        let rebalance = match rebalancer_class {
            Some(rebalancer_class) => {
                let min_active_replicas = match fields.min_active_replicas {
                    None => DEFAULT_MIN_ACTIVE_REPLICAS,
                    Some(v) => u32::try_from(v)
                        .ok()
                        .filter(|m| *m <= replica_count)
                        .ok_or_else(|| {
                            SyncError::config(
                                field("minActiveReplicas"),
                                format!("must be between 0 and numReplicas ({}), got {}", replica_count, v),
                            )
                        })?,
                };
                let delay_minutes = match fields.rebalance_delay_in_mins {
                    None => DEFAULT_REBALANCE_DELAY_MINS,
                    Some(v) => u64::try_from(v).map_err(|_| {
                        SyncError::config(
                            field("rebalanceDelayInMins"),
                            format!("must not be negative, got {}", v),
                        )
                    })?,
                };
                DelayedRebalancePolicy {
                    rebalancer_class,
                    min_active_replicas,
                    delay_minutes,
                }
                .into_mode(rebalance_strategy)
            }
            None => {
                let strategy = rebalance_strategy.ok_or_else(|| {
                    SyncError::config(
                        field("rebalanceStrategy"),
                        "missing required field (required unless rebalancerClassName is set)",
                    )
                })?;
                if fields.min_active_replicas.is_some() || fields.rebalance_delay_in_mins.is_some() {
                    warn!("minActiveReplicas/rebalanceDelayInMins ignored without rebalancerClassName");
                }
                RebalanceMode::FullAuto { strategy }
            }
        };

        Ok(IdealStateConfig {
            replica_count,
            state_model,
            rebalance,
        })
    }
}

impl From<IdealStateConfig> for IdealStateConfigFields {
    fn from(config: IdealStateConfig) -> Self {
        let (rebalance_strategy, rebalancer_class_name, min_active_replicas, rebalance_delay_in_mins) =
            match config.rebalance {
                RebalanceMode::FullAuto { strategy } => (Some(strategy), None, None, None),
                RebalanceMode::DelayedAuto {
                    rebalancer_class,
                    strategy,
                    min_active_replicas,
                    delay_minutes,
                } => (
                    strategy,
                    Some(rebalancer_class),
                    Some(i64::from(min_active_replicas)),
                    Some(i64::try_from(delay_minutes).unwrap_or(i64::MAX)),
                ),
            };
        Self {
            num_replicas: Some(i64::from(config.replica_count)),
            state_model_def_ref: Some(config.state_model),
            rebalance_strategy,
            rebalancer_class_name,
            min_active_replicas,
            rebalance_delay_in_mins,
        }
    }
}

impl TryFrom<SyncConfigDocument> for SyncConfig {
    type Error = SyncError;

    fn try_from(doc: SyncConfigDocument) -> Result<Self> {
        let fields = doc
            .ideal_state_config_fields
            .ok_or_else(|| SyncError::config(IDEAL_STATE, "missing required section"))?;
        let ideal_state = IdealStateConfig::try_from(fields)?;

        let ignore = match doc.ignore_resource_key_words {
            None => IgnoreSet::default(),
            Some(keywords) => {
                if let Some(i) = keywords.iter().position(|k| k.is_empty()) {
                    return Err(SyncError::config(
                        format!("ignoreResourceKeyWords[{}]", i),
                        "keyword must not be empty",
                    ));
                }
                IgnoreSet::new(keywords)
            }
        };

        Ok(SyncConfig {
            cluster: doc.cluster_config_fields,
            ideal_state,
            ignore,
        })
    }
}

impl From<SyncConfig> for SyncConfigDocument {
    fn from(config: SyncConfig) -> Self {
        Self {
            cluster_config_fields: config.cluster,
            ideal_state_config_fields: Some(config.ideal_state.into()),
            ignore_resource_key_words: Some(config.ignore.keywords().map(str::to_string).collect()),
        }
    }
}
