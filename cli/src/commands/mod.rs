//! CLI command implementations

pub mod bootstrap;
pub mod refresh;
pub mod sync;
pub mod verify;

use crate::output::OutputFormat;
use vcr_sync::report::PassOutcome;
use vcr_sync::shutdown::ShutdownCoordinator;
use vcr_sync::SyncConfig;

/// Shared state for a command invocation.
pub struct Context {
    pub config: SyncConfig,
    pub format: OutputFormat,
    pub shutdown: ShutdownCoordinator,
}

/// How a command finished, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    PartialFailure,
    Drift,
    Cancelled,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::PartialFailure => 2,
            Outcome::Drift => 3,
            Outcome::Cancelled => 130,
        }
    }
}

impl From<PassOutcome> for Outcome {
    fn from(outcome: PassOutcome) -> Self {
        match outcome {
            PassOutcome::Success => Outcome::Success,
            PassOutcome::PartialFailure => Outcome::PartialFailure,
            PassOutcome::Cancelled => Outcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::from(PassOutcome::Success).exit_code(), 0);
        assert_eq!(Outcome::from(PassOutcome::PartialFailure).exit_code(), 2);
        assert_eq!(Outcome::from(PassOutcome::Cancelled).exit_code(), 130);
        assert_eq!(Outcome::Drift.exit_code(), 3);
    }
}
