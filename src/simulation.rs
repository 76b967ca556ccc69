//! Simulation execution loop.
//!
//! Owns the event queue, the periodic task table and the clock. `run` pops
//! events in `(time, id)` order, advances the clock to each event's time and
//! hands the action a [`SimContext`] through which it can read the time and
//! schedule or cancel further work. The loop is single-threaded and every
//! action runs to completion before the next event is considered.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, trace, warn};

use crate::action::{self, ActionResult, IntoActionResult, RepeatingAction};
use crate::clock::{ClockHandle, TimeSource};
use crate::config::SimConfig;
use crate::error::{ActionFault, FaultKind, SimError, SimResult};
use crate::event::{Event, EventHandle, EventId, Payload};
use crate::scheduler::Scheduler;
use crate::stop::{Progress, RunOutcome, RunSummary, StopCondition};
use crate::task::{Periodic, PeriodicTask, TaskHandle, TaskId, TaskTable};
use crate::time::{SimDuration, SimTime};
use crate::trace::{ExecutionTrace, Origin};

type DestroyHook = Box<dyn FnOnce(SimTime)>;

/// Source of per-process simulation instance ids, stamped into every handle.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

// ── Simulation Context ───────────────────────────────────────────────

/// Scheduling capability handed to every action.
///
/// The context borrows the queue and task table mutably for the duration of
/// one action, so an action can schedule, cancel and stop, but can never
/// move the clock or dispatch events itself.
pub struct SimContext<'a> {
    instance: u64,
    scheduler: &'a mut Scheduler,
    tasks: &'a mut TaskTable,
    stop: &'a mut StopCondition,
    now: SimTime,
    current: Option<EventId>,
    current_task: Option<TaskId>,
}

impl<'a> SimContext<'a> {
    /// Current simulated time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The event whose action is running, if any.
    pub fn current_event(&self) -> Option<EventId> {
        self.current
    }

    /// The periodic task whose action is running, if any.
    pub fn current_task(&self) -> Option<TaskHandle> {
        self.current_task.map(|id| TaskHandle::new(self.instance, id))
    }

    /// Schedule `action` to run `delay` after now.
    pub fn schedule<F, R>(&mut self, delay: SimDuration, action: F) -> SimResult<EventHandle>
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        let at = self.resolve_delay(delay)?;
        Ok(self.push_once(at, action))
    }

    /// Schedule `action` at the absolute instant `at`.
    pub fn schedule_at<F, R>(&mut self, at: SimTime, action: F) -> SimResult<EventHandle>
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        if at < self.now {
            return Err(SimError::PastScheduling {
                requested: at,
                now: self.now,
            });
        }
        Ok(self.push_once(at, action))
    }

    /// Schedule `action` at the current instant, after everything already
    /// queued for it.
    pub fn schedule_now<F, R>(&mut self, action: F) -> EventHandle
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        self.push_once(self.now, action)
    }

    /// Start a periodic task. The first occurrence runs `cadence.start()`
    /// after now; the run loop queues each following occurrence itself.
    ///
    /// A task whose window is already empty (for example `max_runs(0)`) is
    /// retired immediately and never runs.
    pub fn schedule_periodic<F, R>(&mut self, cadence: Periodic, action: F) -> SimResult<TaskHandle>
    where
        F: FnMut(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        if cadence.period() <= SimDuration::ZERO {
            return Err(SimError::InvalidPeriod {
                period: cadence.period(),
            });
        }
        let first = self.resolve_delay(cadence.start())?;
        let id = self.tasks.allocate_id();

        if !cadence.admits(first, 0) {
            debug!(task = %id, "periodic task window is empty; not started");
            return Ok(TaskHandle::new(self.instance, id));
        }

        let next_event = self.scheduler.schedule(first, Payload::Tick(id));
        self.tasks.insert(
            id,
            PeriodicTask {
                cadence,
                action: Some(action::boxed_repeating(action)),
                runs: 0,
                next_event,
            },
        );
        trace!(task = %id, first = %first, period = %cadence.period(), "periodic task started");
        Ok(TaskHandle::new(self.instance, id))
    }

    /// Cancel a pending event. Returns `true` if it was still pending;
    /// cancelling an executed or already cancelled event is a no-op.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        handle.sim() == self.instance && self.scheduler.cancel(handle.id())
    }

    /// Retire a periodic task, including from inside its own action.
    /// Returns `true` if the task was active.
    pub fn cancel_task(&mut self, handle: TaskHandle) -> bool {
        if handle.sim() != self.instance {
            return false;
        }
        match self.tasks.remove(handle.id()) {
            Some(task) => {
                self.scheduler.cancel(task.next_event);
                trace!(task = %handle.id(), runs = task.runs, "periodic task cancelled");
                true
            }
            None => false,
        }
    }

    /// As [`cancel_task`](Self::cancel_task), reporting an inactive task
    /// as [`SimError::UnknownTask`].
    pub fn try_cancel_task(&mut self, handle: TaskHandle) -> SimResult<()> {
        if self.cancel_task(handle) {
            Ok(())
        } else {
            Err(SimError::UnknownTask(handle.id()))
        }
    }

    /// Whether the event is still queued and not cancelled.
    pub fn is_pending(&self, handle: EventHandle) -> bool {
        handle.sim() == self.instance && self.scheduler.is_live(handle.id())
    }

    /// Time remaining until a pending event runs.
    pub fn delay_left(&self, handle: EventHandle) -> Option<SimDuration> {
        if !self.is_pending(handle) {
            return None;
        }
        handle.scheduled_at().duration_since(self.now)
    }

    /// Whether the periodic task is still scheduled.
    pub fn is_task_active(&self, handle: TaskHandle) -> bool {
        self.task(handle).is_some()
    }

    /// Completed executions of an active task.
    pub fn task_runs(&self, handle: TaskHandle) -> Option<u64> {
        self.task(handle).map(|t| t.runs)
    }

    fn task(&self, handle: TaskHandle) -> Option<&PeriodicTask> {
        if handle.sim() != self.instance {
            return None;
        }
        self.tasks.get(handle.id())
    }

    /// End the current run once this action returns.
    pub fn stop(&mut self) {
        self.stop.halt = true;
    }

    /// Set the (inclusive) stop bound.
    pub fn stop_at(&mut self, at: SimTime) -> SimResult<()> {
        if at < self.now {
            return Err(SimError::PastScheduling {
                requested: at,
                now: self.now,
            });
        }
        self.stop.at = Some(at);
        Ok(())
    }

    /// Set the stop bound `delay` after now.
    pub fn stop_after(&mut self, delay: SimDuration) -> SimResult<()> {
        let at = self.resolve_delay(delay)?;
        self.stop.at = Some(at);
        Ok(())
    }

    /// Live events still queued.
    pub fn pending_count(&self) -> usize {
        self.scheduler.len()
    }

    fn resolve_delay(&self, delay: SimDuration) -> SimResult<SimTime> {
        if delay.is_negative() {
            return Err(SimError::InvalidDelay { delay });
        }
        self.now
            .checked_add(delay)
            .ok_or(SimError::TimeOverflow { now: self.now, delay })
    }

    fn push_once<F, R>(&mut self, at: SimTime, action: F) -> EventHandle
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        let id = self
            .scheduler
            .schedule(at, Payload::Once(action::boxed_once(action)));
        EventHandle::new(self.instance, id, at)
    }
}

impl TimeSource for SimContext<'_> {
    fn now(&self) -> SimTime {
        self.now
    }
}

// ── Destroy report ────────────────────────────────────────────────────

/// What teardown released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyReport {
    /// Live events that never ran.
    pub discarded_events: usize,
    /// Periodic tasks that were still active.
    pub discarded_tasks: usize,
    pub hooks_run: usize,
    pub final_time: SimTime,
    pub events_executed: u64,
}

// ── Simulation ────────────────────────────────────────────────────────

/// A discrete-event simulation: one clock, one queue, one run loop.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use kairos::{Periodic, SimDuration, SimTime, Simulation};
///
/// let mut sim = Simulation::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = Rc::clone(&seen);
/// sim.schedule_periodic(Periodic::every(SimDuration::from_secs(1)), move |ctx| {
///     log.borrow_mut().push(ctx.now());
/// })
/// .unwrap();
/// sim.stop_at(SimTime::from_secs(2)).unwrap();
/// sim.run().unwrap();
/// assert_eq!(seen.borrow().len(), 3);
/// sim.destroy();
/// ```
pub struct Simulation {
    instance: u64,
    scheduler: Scheduler,
    tasks: TaskTable,
    stop: StopCondition,
    now: SimTime,
    clock: ClockHandle,
    events_executed: u64,
    trace: Option<ExecutionTrace>,
    destroy_hooks: Vec<DestroyHook>,
    destroyed: bool,
}

impl Simulation {
    /// Create a new simulation starting at time zero.
    pub fn new() -> Self {
        Simulation {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            scheduler: Scheduler::new(),
            tasks: TaskTable::new(),
            stop: StopCondition::default(),
            now: SimTime::ZERO,
            clock: ClockHandle::new(SimTime::ZERO),
            events_executed: 0,
            trace: None,
            destroy_hooks: Vec::new(),
            destroyed: false,
        }
    }

    /// Create a simulation with the stop bound and tracing from `config`.
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let mut sim = Simulation::new();
        if let Some(at) = config.run.stop_at() {
            sim.stop_at(at)?;
        }
        if config.trace.enabled {
            match config.trace.checkpoint_interval {
                Some(n) => sim.enable_trace_with_checkpoints(n),
                None => sim.enable_trace(),
            }
        }
        Ok(sim)
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Schedule `action` to run `delay` after now.
    pub fn schedule<F, R>(&mut self, delay: SimDuration, action: F) -> SimResult<EventHandle>
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        self.context()?.schedule(delay, action)
    }

    /// Schedule `action` at the absolute instant `at`.
    pub fn schedule_at<F, R>(&mut self, at: SimTime, action: F) -> SimResult<EventHandle>
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        self.context()?.schedule_at(at, action)
    }

    /// Schedule `action` at the current instant, after everything already
    /// queued for it.
    pub fn schedule_now<F, R>(&mut self, action: F) -> SimResult<EventHandle>
    where
        F: FnOnce(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        Ok(self.context()?.schedule_now(action))
    }

    /// Start a periodic task; see [`SimContext::schedule_periodic`].
    pub fn schedule_periodic<F, R>(&mut self, cadence: Periodic, action: F) -> SimResult<TaskHandle>
    where
        F: FnMut(&mut SimContext<'_>) -> R + 'static,
        R: IntoActionResult,
    {
        self.context()?.schedule_periodic(cadence, action)
    }

    /// Cancel a pending event; idempotent. Handles from another simulation
    /// are ignored.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        handle.sim() == self.instance && self.scheduler.cancel(handle.id())
    }

    /// Retire a periodic task. Returns `true` if it was active.
    pub fn cancel_task(&mut self, handle: TaskHandle) -> bool {
        match self.context() {
            Ok(mut ctx) => ctx.cancel_task(handle),
            Err(_) => false,
        }
    }

    /// As [`cancel_task`](Self::cancel_task), reporting an inactive task
    /// as [`SimError::UnknownTask`].
    pub fn try_cancel_task(&mut self, handle: TaskHandle) -> SimResult<()> {
        self.context()?.try_cancel_task(handle)
    }

    /// Whether the event is still queued and not cancelled.
    pub fn is_pending(&self, handle: EventHandle) -> bool {
        handle.sim() == self.instance && self.scheduler.is_live(handle.id())
    }

    /// An event is expired once it has run or been cancelled.
    pub fn is_expired(&self, handle: EventHandle) -> bool {
        !self.is_pending(handle)
    }

    /// Time remaining until a pending event runs.
    pub fn delay_left(&self, handle: EventHandle) -> Option<SimDuration> {
        if !self.is_pending(handle) {
            return None;
        }
        handle.scheduled_at().duration_since(self.now)
    }

    /// Whether the periodic task is still scheduled.
    pub fn is_task_active(&self, handle: TaskHandle) -> bool {
        self.task_runs(handle).is_some()
    }

    /// Completed executions of an active task.
    pub fn task_runs(&self, handle: TaskHandle) -> Option<u64> {
        if handle.sim() != self.instance {
            return None;
        }
        self.tasks.get(handle.id()).map(|t| t.runs)
    }

    /// Register `hook` to run once at teardown, in registration order.
    pub fn on_destroy<F>(&mut self, hook: F) -> SimResult<()>
    where
        F: FnOnce(SimTime) + 'static,
    {
        self.ensure_alive()?;
        self.destroy_hooks.push(Box::new(hook));
        Ok(())
    }

    // ── Stop conditions ───────────────────────────────────────

    /// Set the stop bound. Events at exactly `at` still run.
    pub fn stop_at(&mut self, at: SimTime) -> SimResult<()> {
        self.context()?.stop_at(at)
    }

    /// Set the stop bound `delay` after now.
    pub fn stop_after(&mut self, delay: SimDuration) -> SimResult<()> {
        self.context()?.stop_after(delay)
    }

    /// End the run after the first event for which `predicate` holds.
    pub fn stop_when<P>(&mut self, predicate: P) -> SimResult<()>
    where
        P: FnMut(&Progress) -> bool + 'static,
    {
        self.ensure_alive()?;
        self.stop.when = Some(Box::new(predicate));
        Ok(())
    }

    /// The armed stop bound, if any.
    pub fn stop_time(&self) -> Option<SimTime> {
        self.stop.at
    }

    /// Remove the stop bound and predicate.
    pub fn clear_stop(&mut self) {
        self.stop = StopCondition::default();
    }

    // ── Tracing ───────────────────────────────────────────────

    /// Start recording an execution trace, replacing any previous one.
    pub fn enable_trace(&mut self) {
        self.trace = Some(ExecutionTrace::new());
    }

    /// As [`enable_trace`](Self::enable_trace), checkpointing every
    /// `interval` events.
    pub fn enable_trace_with_checkpoints(&mut self, interval: u64) {
        self.trace = Some(ExecutionTrace::with_checkpoint_interval(interval));
    }

    /// The trace recorded so far, if tracing is enabled.
    pub fn trace(&self) -> Option<&ExecutionTrace> {
        self.trace.as_ref()
    }

    /// Detach the trace, disabling further recording.
    pub fn take_trace(&mut self) -> Option<ExecutionTrace> {
        self.trace.take()
    }

    // ── Inspection ────────────────────────────────────────────

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// A read-only clock view for collaborators outside the run loop.
    pub fn clock(&self) -> ClockHandle {
        self.clock.clone()
    }

    /// Total events executed since creation.
    pub fn events_executed(&self) -> u64 {
        self.events_executed
    }

    /// Live events still queued.
    pub fn pending_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Periodic tasks not yet retired.
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if there are no more events to run.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// Whether teardown has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ── Execution ─────────────────────────────────────────────

    /// Run until the queue drains, the stop bound is reached, or a stop is
    /// requested. An [`ActionFault`] ends the run early; the remaining queue
    /// is intact and `run` may be called again.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        self.run_bounded(None)
    }

    /// As [`run`](Self::run), executing at most `max_events` events.
    pub fn run_for(&mut self, max_events: u64) -> SimResult<RunSummary> {
        self.run_bounded(Some(max_events))
    }

    /// Execute the single next event, ignoring the stop bound.
    ///
    /// Returns the executed event's id, or `None` if the queue is empty.
    pub fn step(&mut self) -> SimResult<Option<EventId>> {
        self.ensure_alive()?;
        self.dispatch_next()
    }

    fn run_bounded(&mut self, limit: Option<u64>) -> SimResult<RunSummary> {
        self.ensure_alive()?;
        let start = self.events_executed;
        self.stop.halt = false;
        info!(now = %self.now, pending = self.scheduler.len(), stop_at = ?self.stop.at, "run started");

        let outcome = loop {
            if self.stop.halt {
                self.stop.halt = false;
                break RunOutcome::Halted;
            }
            if limit.is_some_and(|max| self.events_executed - start >= max) {
                break RunOutcome::EventLimit;
            }
            let Some(next) = self.scheduler.peek_time() else {
                break RunOutcome::Drained;
            };
            if self.stop.excludes(next) {
                // `excludes` only holds when a bound is set.
                let bound = self.stop.at.take().unwrap_or(next);
                if bound > self.now {
                    self.set_clock(bound);
                }
                break RunOutcome::ReachedStopTime(bound);
            }

            self.dispatch_next()?;

            let progress = Progress {
                now: self.now,
                events_executed: self.events_executed,
            };
            if self.stop.predicate_fired(&progress) {
                break RunOutcome::Halted;
            }
        };

        let summary = RunSummary {
            outcome,
            executed: self.events_executed - start,
            now: self.now,
        };
        info!(
            outcome = ?summary.outcome,
            executed = summary.executed,
            now = %summary.now,
            pending = self.scheduler.len(),
            "run finished"
        );
        Ok(summary)
    }

    /// Pop one live event, advance the clock and execute it.
    fn dispatch_next(&mut self) -> SimResult<Option<EventId>> {
        let Some(Event {
            id,
            scheduled_at,
            payload,
        }) = self.scheduler.pop_next()
        else {
            return Ok(None);
        };

        debug_assert!(scheduled_at >= self.now, "clock would run backwards");
        self.set_clock(scheduled_at);
        self.events_executed += 1;

        match payload {
            Payload::Once(action) => {
                self.record(id, Origin::Once);
                debug!(event = %id, at = %scheduled_at, "dispatch");
                self.invoke(id, None, action)
                    .map_err(|kind| self.fault(id, None, kind))?;
            }
            Payload::Tick(task) => {
                self.record(id, Origin::task(task));
                debug!(event = %id, task = %task, at = %scheduled_at, "dispatch periodic");
                let Some(mut action) = self.tasks.take_action(task) else {
                    // Unreachable while `cancel_task` also cancels the queued tick.
                    warn!(event = %id, task = %task, "tick for a retired task skipped");
                    return Ok(Some(id));
                };
                let outcome = self.invoke(id, Some(task), |ctx| action(ctx));
                self.finish_tick(task, action, outcome.is_ok());
                outcome.map_err(|kind| self.fault(id, Some(task), kind))?;
            }
        }
        Ok(Some(id))
    }

    fn invoke<F>(&mut self, id: EventId, task: Option<TaskId>, action: F) -> Result<(), FaultKind>
    where
        F: FnOnce(&mut SimContext<'_>) -> ActionResult,
    {
        let mut ctx = SimContext {
            instance: self.instance,
            scheduler: &mut self.scheduler,
            tasks: &mut self.tasks,
            stop: &mut self.stop,
            now: self.now,
            current: Some(id),
            current_task: task,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| action(&mut ctx))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FaultKind::Failed(e)),
            Err(payload) => Err(FaultKind::Panicked(panic_message(&*payload))),
        }
    }

    /// Put a task's action back and queue its next occurrence, or retire it.
    fn finish_tick(&mut self, id: TaskId, action: RepeatingAction, succeeded: bool) {
        let Some(task) = self.tasks.get_mut(id) else {
            // Cancelled from inside its own action.
            return;
        };
        task.runs += 1;

        if !succeeded {
            self.tasks.remove(id);
            return;
        }

        match self.now.checked_add(task.cadence.period()) {
            Some(next) if task.cadence.admits(next, task.runs) => {
                task.action = Some(action);
                task.next_event = self.scheduler.schedule(next, Payload::Tick(id));
            }
            _ => {
                debug!(task = %id, runs = task.runs, "periodic task retired");
                self.tasks.remove(id);
            }
        }
    }

    fn fault(&self, event: EventId, task: Option<TaskId>, kind: FaultKind) -> SimError {
        warn!(event = %event, task = ?task, at = %self.now, error = %kind, "action fault");
        SimError::ActionFault(ActionFault {
            event,
            at: self.now,
            task,
            kind,
        })
    }

    fn record(&mut self, id: EventId, origin: Origin) {
        if let Some(trace) = self.trace.as_mut() {
            trace.record(id, self.now, origin, self.scheduler.len());
        }
    }

    // ── Teardown ──────────────────────────────────────────────

    /// Tear the simulation down: run destroy hooks, then drop every queued
    /// event and task along with whatever they captured.
    ///
    /// Safe to call more than once; only the first call has any effect and
    /// returns a report.
    pub fn destroy(&mut self) -> Option<DestroyReport> {
        self.try_destroy().ok()
    }

    /// As [`destroy`](Self::destroy), but reports a second call as
    /// [`SimError::DoubleDestroy`].
    pub fn try_destroy(&mut self) -> SimResult<DestroyReport> {
        if self.destroyed {
            return Err(SimError::DoubleDestroy);
        }
        self.destroyed = true;

        let hooks = std::mem::take(&mut self.destroy_hooks);
        let hooks_run = hooks.len();
        for hook in hooks {
            hook(self.now);
        }

        let report = DestroyReport {
            discarded_events: self.scheduler.clear(),
            discarded_tasks: self.tasks.clear(),
            hooks_run,
            final_time: self.now,
            events_executed: self.events_executed,
        };
        self.stop = StopCondition::default();

        info!(
            now = %report.final_time,
            executed = report.events_executed,
            discarded_events = report.discarded_events,
            discarded_tasks = report.discarded_tasks,
            "simulation destroyed"
        );
        Ok(report)
    }

    // ── Internals ─────────────────────────────────────────────

    fn ensure_alive(&self) -> SimResult<()> {
        if self.destroyed {
            Err(SimError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn context(&mut self) -> SimResult<SimContext<'_>> {
        self.ensure_alive()?;
        Ok(SimContext {
            instance: self.instance,
            scheduler: &mut self.scheduler,
            tasks: &mut self.tasks,
            stop: &mut self.stop,
            now: self.now,
            current: None,
            current_task: None,
        })
    }

    fn set_clock(&mut self, at: SimTime) {
        self.now = at;
        self.clock.publish(at);
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if !self.destroyed {
            let _ = self.try_destroy();
        }
    }
}

impl TimeSource for Simulation {
    fn now(&self) -> SimTime {
        self.now
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("instance", &self.instance)
            .field("now", &self.now)
            .field("pending", &self.scheduler.len())
            .field("queued_entries", &self.scheduler.queued_entries())
            .field("next_event_id", &self.scheduler.next_event_id())
            .field("tasks", &self.tasks)
            .field("stop", &self.stop)
            .field("events_executed", &self.events_executed)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
