//! Per-pass results of reconcile and refresh operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Which topology operation produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Reconcile,
    Refresh,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Reconcile => "reconcile",
            Operation::Refresh => "refresh",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one resource during a pass.
///
/// In a dry run, `Created`, `Expanded` and `Refreshed` describe the mutation
/// that would have been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResourceAction {
    /// The resource was added to the destination.
    Created { partitions: usize },
    /// Missing partitions were added to an existing destination resource.
    Expanded { added: usize, partitions: usize },
    /// The resource's replication policy was rewritten.
    Refreshed { partitions: usize },
    /// Nothing needed to change.
    Unchanged { partitions: usize },
    /// The resource name matched an ignore keyword.
    Ignored { keyword: String },
    /// The resource disappeared between enumeration and read.
    Skipped { reason: String },
    /// Applying the mutation failed.
    Failed { error: String },
}

impl ResourceAction {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceAction::Created { .. } => "created",
            ResourceAction::Expanded { .. } => "expanded",
            ResourceAction::Refreshed { .. } => "refreshed",
            ResourceAction::Unchanged { .. } => "unchanged",
            ResourceAction::Ignored { .. } => "ignored",
            ResourceAction::Skipped { .. } => "skipped",
            ResourceAction::Failed { .. } => "failed",
        }
    }

    /// Whether the action changes (or would change) the destination.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ResourceAction::Created { .. }
                | ResourceAction::Expanded { .. }
                | ResourceAction::Refreshed { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResourceAction::Failed { .. })
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAction::Created { partitions } => write!(f, "created ({} partitions)", partitions),
            ResourceAction::Expanded { added, partitions } => {
                write!(f, "expanded (+{} -> {} partitions)", added, partitions)
            }
            ResourceAction::Refreshed { partitions } => {
                write!(f, "refreshed ({} partitions)", partitions)
            }
            ResourceAction::Unchanged { partitions } => {
                write!(f, "unchanged ({} partitions)", partitions)
            }
            ResourceAction::Ignored { keyword } => write!(f, "ignored (matches '{}')", keyword),
            ResourceAction::Skipped { reason } => write!(f, "skipped ({})", reason),
            ResourceAction::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// Outcome of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub resource: String,
    #[serde(flatten)]
    pub action: ResourceAction,
}

/// Overall result of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every resource was processed without error.
    Success,
    /// At least one resource failed while others were processed.
    PartialFailure,
    /// The pass stopped early on a cancellation request.
    Cancelled,
}

/// Result of a reconcile or refresh pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub operation: Operation,
    /// Source cluster, for reconcile passes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_cluster: Option<String>,
    pub destination_cluster: String,
    pub dry_run: bool,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub resources: Vec<ResourceReport>,
}

impl ReconcileReport {
    pub fn new(
        operation: Operation,
        source_cluster: Option<&str>,
        destination_cluster: &str,
        dry_run: bool,
    ) -> Self {
        Self {
            operation,
            source_cluster: source_cluster.map(str::to_string),
            destination_cluster: destination_cluster.to_string(),
            dry_run,
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
            resources: Vec::new(),
        }
    }

    pub fn record(&mut self, resource: impl Into<String>, action: ResourceAction) {
        self.resources.push(ResourceReport {
            resource: resource.into(),
            action,
        });
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Action recorded for `resource`, if it was processed.
    pub fn action_for(&self, resource: &str) -> Option<&ResourceAction> {
        self.resources
            .iter()
            .find(|r| r.resource == resource)
            .map(|r| &r.action)
    }

    /// Number of resources with the given action label.
    pub fn count(&self, label: &str) -> usize {
        self.resources
            .iter()
            .filter(|r| r.action.label() == label)
            .count()
    }

    pub fn mutation_count(&self) -> usize {
        self.resources.iter().filter(|r| r.action.is_mutation()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceReport> {
        self.resources.iter().filter(|r| r.action.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn outcome(&self) -> PassOutcome {
        if self.cancelled {
            PassOutcome::Cancelled
        } else if self.has_failures() {
            PassOutcome::PartialFailure
        } else {
            PassOutcome::Success
        }
    }

    /// One-line summary for logs and terminal output.
    pub fn summary(&self) -> String {
        format!(
            "{}{}: {} created, {} expanded, {} refreshed, {} unchanged, {} ignored, {} skipped, {} failed{}",
            self.operation,
            if self.dry_run { " (dry run)" } else { "" },
            self.count("created"),
            self.count("expanded"),
            self.count("refreshed"),
            self.count("unchanged"),
            self.count("ignored"),
            self.count("skipped"),
            self.count("failed"),
            if self.cancelled { ", cancelled" } else { "" },
        )
    }
}
