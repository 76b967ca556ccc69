//! Structured error types for the kernel.
//!
//! Scheduling mistakes (negative delays, instants in the past) are reported
//! synchronously to the caller and never disturb a run in progress. A
//! failing action surfaces as [`SimError::ActionFault`] from `run`/`step`,
//! with the queue left exactly as it was when the action gave up.

use thiserror::Error;

use crate::action::BoxError;
use crate::event::EventId;
use crate::task::TaskId;
use crate::time::{SimDuration, SimTime};

/// The top-level error type for the simulation kernel.
#[derive(Debug, Error)]
pub enum SimError {
    // ── Scheduling errors ─────────────────────────────────

    /// A relative delay was negative.
    #[error("invalid delay {delay}: delays must be non-negative")]
    InvalidDelay { delay: SimDuration },

    /// An absolute instant was before the current time.
    #[error("cannot schedule at {requested} when current time is {now}")]
    PastScheduling { requested: SimTime, now: SimTime },

    /// The requested instant does not fit the clock.
    #[error("scheduling {delay} after {now} overflows the clock")]
    TimeOverflow { now: SimTime, delay: SimDuration },

    /// A periodic task needs a strictly positive period.
    #[error("invalid period {period}: periods must be positive")]
    InvalidPeriod { period: SimDuration },

    /// A task handle does not refer to an active task.
    #[error("task {0} is not active")]
    UnknownTask(TaskId),

    // ── Lifecycle errors ──────────────────────────────────

    /// Teardown was requested a second time.
    #[error("simulation has already been destroyed")]
    DoubleDestroy,

    /// The simulation was used after teardown.
    #[error("simulation has been destroyed")]
    Destroyed,

    // ── Execution errors ──────────────────────────────────

    /// A scheduled action failed or panicked.
    #[error(transparent)]
    ActionFault(#[from] ActionFault),

    // ── Configuration errors ──────────────────────────────

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SimError {
    /// Scheduling errors are local to the call site; everything else is
    /// about the run or the simulation as a whole.
    pub fn is_scheduling_error(&self) -> bool {
        matches!(
            self,
            SimError::InvalidDelay { .. }
                | SimError::PastScheduling { .. }
                | SimError::TimeOverflow { .. }
                | SimError::InvalidPeriod { .. }
                | SimError::UnknownTask(_)
        )
    }
}

/// An action that did not complete.
#[derive(Debug, Error)]
#[error("action for {event} at {at} {kind}")]
pub struct ActionFault {
    /// The event whose action failed.
    pub event: EventId,
    /// Simulated time at which it ran.
    pub at: SimTime,
    /// The periodic task the event belonged to, if any.
    pub task: Option<TaskId>,
    pub kind: FaultKind,
}

#[derive(Debug, Error)]
pub enum FaultKind {
    #[error("failed: {0}")]
    Failed(#[source] BoxError),

    #[error("panicked: {0}")]
    Panicked(String),
}

/// Errors loading or validating a [`SimConfig`](crate::config::SimConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_past_scheduling() {
        let e = SimError::PastScheduling {
            requested: SimTime::from_secs(3),
            now: SimTime::from_secs(10),
        };
        let s = e.to_string();
        assert!(s.contains("+3s"));
        assert!(s.contains("+10s"));
    }

    #[test]
    fn test_display_invalid_delay() {
        let e = SimError::InvalidDelay { delay: SimDuration::from_millis(-5) };
        assert_eq!(e.to_string(), "invalid delay -0.005s: delays must be non-negative");
    }

    #[test]
    fn test_display_action_fault() {
        let fault = ActionFault {
            event: EventId::new(7),
            at: SimTime::from_secs(2),
            task: None,
            kind: FaultKind::Panicked("boom".into()),
        };
        assert_eq!(SimError::from(fault).to_string(), "action for E#7 at +2s panicked: boom");
    }

    #[test]
    fn test_fault_source_chain() {
        use std::error::Error as _;
        let fault = ActionFault {
            event: EventId::new(0),
            at: SimTime::ZERO,
            task: Some(TaskId::new(1)),
            kind: FaultKind::Failed("queue overflow".into()),
        };
        assert_eq!(fault.kind.source().map(|s| s.to_string()), Some("queue overflow".into()));
    }

    #[test]
    fn test_scheduling_classification() {
        assert!(SimError::InvalidDelay { delay: SimDuration::from_nanos(-1) }.is_scheduling_error());
        assert!(!SimError::DoubleDestroy.is_scheduling_error());
        assert!(!SimError::Destroyed.is_scheduling_error());
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(SimError::DoubleDestroy);
        assert!(!e.to_string().is_empty());
    }
}
