//! Periodic tasks.
//!
//! A periodic task owns a repeating action and a cadence. Only one
//! occurrence of a task is ever queued: when it fires, the run loop executes
//! the action and then queues the next occurrence itself, so a task that
//! repeats forever never grows the call stack.

use std::collections::BTreeMap;

use crate::action::RepeatingAction;
use crate::event::EventId;
use crate::time::{SimDuration, SimTime};

// ── Task ID ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        TaskId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T#{}", self.0)
    }
}

/// Handle returned by `schedule_periodic`, used to cancel or inspect a task.
/// Only the simulation that issued it recognises it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    sim: u64,
    id: TaskId,
}

impl TaskHandle {
    pub(crate) fn new(sim: u64, id: TaskId) -> Self {
        TaskHandle { sim, id }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Instance id of the issuing simulation.
    pub(crate) fn sim(&self) -> u64 {
        self.sim
    }
}

// ── Periodic ──────────────────────────────────────────────────────────

/// Cadence of a periodic task.
///
/// ```rust
/// use kairos::{Periodic, SimDuration, SimTime};
///
/// // An echo client: first packet at 2s, every 100ms, at most 4 packets,
/// // nothing after 10s.
/// let cadence = Periodic::every(SimDuration::from_millis(100))
///     .starting_in(SimDuration::from_secs(2))
///     .until(SimTime::from_secs(10))
///     .max_runs(4);
/// assert_eq!(cadence.period(), SimDuration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    period: SimDuration,
    start: SimDuration,
    until: Option<SimTime>,
    max_runs: Option<u64>,
}

impl Periodic {
    /// Run every `period`, starting immediately.
    pub fn every(period: SimDuration) -> Self {
        Periodic {
            period,
            start: SimDuration::ZERO,
            until: None,
            max_runs: None,
        }
    }

    /// Delay before the first occurrence, relative to when it is scheduled.
    pub fn starting_in(mut self, delay: SimDuration) -> Self {
        self.start = delay;
        self
    }

    /// Last instant (inclusive) at which an occurrence may run.
    pub fn until(mut self, at: SimTime) -> Self {
        self.until = Some(at);
        self
    }

    /// Retire the task after `n` executions.
    pub fn max_runs(mut self, n: u64) -> Self {
        self.max_runs = Some(n);
        self
    }

    pub fn period(&self) -> SimDuration {
        self.period
    }

    pub fn start(&self) -> SimDuration {
        self.start
    }

    pub fn end(&self) -> Option<SimTime> {
        self.until
    }

    pub fn run_limit(&self) -> Option<u64> {
        self.max_runs
    }

    /// Whether an occurrence at `at`, after `runs` completed executions,
    /// is still inside the task's window.
    pub(crate) fn admits(&self, at: SimTime, runs: u64) -> bool {
        let in_time = self.until.map_or(true, |end| at <= end);
        let in_count = self.max_runs.map_or(true, |max| runs < max);
        in_time && in_count
    }
}

// ── Task table ────────────────────────────────────────────────────────

pub(crate) struct PeriodicTask {
    pub(crate) cadence: Periodic,
    /// `None` while the action is executing.
    pub(crate) action: Option<RepeatingAction>,
    pub(crate) runs: u64,
    /// The single queued occurrence of this task.
    pub(crate) next_event: EventId,
}

/// Active periodic tasks, keyed by id.
///
/// A `BTreeMap` keeps iteration (and therefore teardown) order stable.
#[derive(Default)]
pub(crate) struct TaskTable {
    tasks: BTreeMap<TaskId, PeriodicTask>,
    next_id: u64,
}

impl TaskTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, id: TaskId, task: PeriodicTask) {
        self.tasks.insert(id, task);
    }

    pub(crate) fn remove(&mut self, id: TaskId) -> Option<PeriodicTask> {
        self.tasks.remove(&id)
    }

    pub(crate) fn get(&self, id: TaskId) -> Option<&PeriodicTask> {
        self.tasks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut PeriodicTask> {
        self.tasks.get_mut(&id)
    }

    /// Take the action out of a task so it can run while the table stays
    /// mutably reachable from the action's context.
    pub(crate) fn take_action(&mut self, id: TaskId) -> Option<RepeatingAction> {
        self.tasks.get_mut(&id).and_then(|task| task.action.take())
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Drop every task (and the state its action captured).
    pub(crate) fn clear(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }
}

impl std::fmt::Debug for TaskTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTable")
            .field("active", &self.tasks.keys().collect::<Vec<_>>())
            .field("next_id", &self.next_id)
            .finish()
    }
}
