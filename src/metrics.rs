//! Metrics recorded by topology passes.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! binary installs a recorder.

use crate::report::{Operation, PassOutcome, ReconcileReport};
use ::metrics::{counter, histogram};

/// Record every resource outcome of a finished pass, plus the pass itself.
pub fn record_pass(report: &ReconcileReport, duration_secs: f64) {
    let operation = report.operation.as_str();
    for entry in &report.resources {
        counter!(
            "vcr_sync_resources_total",
            "operation" => operation,
            "action" => entry.action.label()
        )
        .increment(1);
    }

    let result = match report.outcome() {
        PassOutcome::Success => "success",
        PassOutcome::PartialFailure => "partial_failure",
        PassOutcome::Cancelled => "cancelled",
    };
    counter!("vcr_sync_passes_total", "operation" => operation, "result" => result).increment(1);
    histogram!("vcr_sync_pass_duration_seconds", "operation" => operation).record(duration_secs);
}

/// Record a pass that aborted before producing a report.
pub fn record_aborted(operation: Operation, error_kind: &'static str) {
    counter!("vcr_sync_passes_total", "operation" => operation.as_str(), "result" => "error")
        .increment(1);
    record_error(error_kind);
}

/// Record an error by kind.
pub fn record_error(error_kind: &'static str) {
    counter!("vcr_sync_errors_total", "kind" => error_kind).increment(1);
}

/// Record a cluster bootstrap attempt.
pub fn record_bootstrap(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("vcr_sync_bootstraps_total", "result" => result).increment(1);
}
