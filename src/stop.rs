//! Stop conditions and run results.
//!
//! The stop bound is inclusive: an event scheduled exactly at the bound
//! still runs, anything later does not. A bound or predicate is disarmed
//! once it ends a run, so a later `run()` continues past it.

use crate::time::SimTime;

/// Progress of the current simulation, handed to stop predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub now: SimTime,
    /// Events executed since the simulation was created.
    pub events_executed: u64,
}

pub(crate) type StopPredicate = Box<dyn FnMut(&Progress) -> bool>;

#[derive(Default)]
pub(crate) struct StopCondition {
    pub(crate) at: Option<SimTime>,
    pub(crate) when: Option<StopPredicate>,
    /// Set by `SimContext::stop`; ends the run after the current action.
    pub(crate) halt: bool,
}

impl StopCondition {
    /// Whether an event at `at` lies beyond the stop bound.
    pub(crate) fn excludes(&self, at: SimTime) -> bool {
        self.at.map_or(false, |bound| at > bound)
    }

    /// Evaluate the predicate, disarming it if it fires.
    pub(crate) fn predicate_fired(&mut self, progress: &Progress) -> bool {
        let fired = self.when.as_mut().map_or(false, |pred| pred(progress));
        if fired {
            self.when = None;
        }
        fired
    }
}

impl std::fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopCondition")
            .field("at", &self.at)
            .field("when", &self.when.as_ref().map(|_| ".."))
            .field("halt", &self.halt)
            .finish()
    }
}

/// Why a call to `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No live events remain.
    Drained,
    /// The next event lies beyond the stop bound; the clock now reads the bound.
    ReachedStopTime(SimTime),
    /// An action called `stop()` or the stop predicate fired.
    Halted,
    /// `run_for` executed its maximum number of events.
    EventLimit,
}

/// Result of a successful `run` / `run_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Events executed during this call.
    pub executed: u64,
    /// Clock reading when the call returned.
    pub now: SimTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_is_inclusive() {
        let stop = StopCondition {
            at: Some(SimTime::from_secs(5)),
            ..Default::default()
        };
        assert!(!stop.excludes(SimTime::from_secs(5)));
        assert!(stop.excludes(SimTime::from_nanos(5_000_000_001)));
    }

    #[test]
    fn test_no_bound_excludes_nothing() {
        assert!(!StopCondition::default().excludes(SimTime::MAX));
    }

    #[test]
    fn test_predicate_disarms_after_firing() {
        let mut stop = StopCondition {
            when: Some(Box::new(|p: &Progress| p.events_executed >= 2)),
            ..Default::default()
        };
        let mut progress = Progress { now: SimTime::ZERO, events_executed: 1 };
        assert!(!stop.predicate_fired(&progress));
        progress.events_executed = 2;
        assert!(stop.predicate_fired(&progress));
        assert!(stop.when.is_none());
        assert!(!stop.predicate_fired(&progress));
    }
}
