//! End-to-end scenarios driven through the public API only.

use std::cell::RefCell;
use std::rc::Rc;

use kairos::{
    traces_match, ClockHandle, ExecutionTrace, Periodic, RunOutcome, SimConfig, SimContext,
    SimDuration, SimError, SimTime, Simulation, TimeSource,
};

type Log = Rc<RefCell<Vec<SimTime>>>;

/// Re-schedules itself one second later, forever.
fn tick(ctx: &mut SimContext<'_>, log: Log) {
    log.borrow_mut().push(ctx.now());
    let next = Rc::clone(&log);
    ctx.schedule(SimDuration::from_secs(1), move |ctx| tick(ctx, next))
        .unwrap();
}

#[test]
fn self_rescheduling_action_runs_six_times_with_inclusive_stop() {
    let mut sim = Simulation::new();
    let log: Log = Rc::default();

    let l = Rc::clone(&log);
    sim.schedule_now(move |ctx| tick(ctx, l)).unwrap();
    sim.stop_at(SimTime::from_secs(5)).unwrap();

    let summary = sim.run().unwrap();
    let expected: Vec<SimTime> = (0..=5).map(SimTime::from_secs).collect();
    assert_eq!(*log.borrow(), expected);
    assert_eq!(summary.outcome, RunOutcome::ReachedStopTime(SimTime::from_secs(5)));
    assert_eq!(summary.executed, 6);
    assert_eq!(sim.now(), SimTime::from_secs(5));
    // The occurrence at 6s is still queued.
    assert_eq!(sim.pending_count(), 1);
}

#[test]
fn periodic_task_matches_self_rescheduling() {
    let mut sim = Simulation::new();
    let log: Log = Rc::default();

    let l = Rc::clone(&log);
    sim.schedule_periodic(Periodic::every(SimDuration::from_secs(1)), move |ctx| {
        l.borrow_mut().push(ctx.now());
    })
    .unwrap();
    sim.stop_at(SimTime::from_secs(5)).unwrap();
    sim.run().unwrap();

    assert_eq!(log.borrow().len(), 6);
    assert_eq!(log.borrow().last(), Some(&SimTime::from_secs(5)));
}

#[test]
fn same_time_actions_run_in_insertion_order() {
    let mut sim = Simulation::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    // Something earlier and later to shuffle the heap around.
    sim.schedule_at(SimTime::from_secs(3), |_ctx| {}).unwrap();
    for n in 1..=2 {
        let order = Rc::clone(&order);
        sim.schedule_at(SimTime::from_secs(2), move |_ctx| order.borrow_mut().push(n))
            .unwrap();
    }
    sim.schedule_at(SimTime::from_secs(1), |_ctx| {}).unwrap();

    sim.run().unwrap();
    assert_eq!(*order.borrow(), vec![1, 2]);
}

#[test]
fn drained_run_leaves_clock_at_last_event() {
    let mut sim = Simulation::new();
    sim.schedule(SimDuration::from_millis(1_500), |_ctx| {}).unwrap();
    sim.stop_at(SimTime::from_secs(5)).unwrap();

    let summary = sim.run().unwrap();
    assert_eq!(summary.outcome, RunOutcome::Drained);
    assert_eq!(sim.now(), SimTime::from_millis(1_500));
}

#[test]
fn scheduling_errors_are_reported_to_the_caller() {
    let mut sim = Simulation::new();
    sim.schedule_at(SimTime::from_secs(2), |_ctx| {}).unwrap();
    sim.run().unwrap();

    let err = sim.schedule_at(SimTime::from_secs(1), |_ctx| {}).unwrap_err();
    assert!(err.is_scheduling_error());
    assert!(matches!(err, SimError::PastScheduling { .. }));

    let err = sim.schedule(SimDuration::from_nanos(-1), |_ctx| {}).unwrap_err();
    assert!(matches!(err, SimError::InvalidDelay { .. }));

    // Scheduling at exactly now is allowed.
    sim.schedule_at(SimTime::from_secs(2), |_ctx| {}).unwrap();
    assert_eq!(sim.run().unwrap().executed, 1);
}

#[test]
fn faulting_action_does_not_poison_the_simulation() {
    let mut sim = Simulation::new();
    let log: Log = Rc::default();

    sim.schedule_at(SimTime::from_secs(1), |_ctx| Err::<(), _>("boom"))
        .unwrap();
    let l = Rc::clone(&log);
    sim.schedule_at(SimTime::from_secs(2), move |ctx| l.borrow_mut().push(ctx.now()))
        .unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimError::ActionFault(ref f) if f.at == SimTime::from_secs(1)));
    assert!(log.borrow().is_empty());

    sim.run().unwrap();
    assert_eq!(*log.borrow(), vec![SimTime::from_secs(2)]);
}

#[test]
fn destroy_twice_has_no_further_effect() {
    let mut sim = Simulation::new();
    let calls = Rc::new(RefCell::new(Vec::new()));

    for n in 0..3 {
        let calls = Rc::clone(&calls);
        sim.on_destroy(move |_at| calls.borrow_mut().push(n)).unwrap();
    }
    sim.schedule(SimDuration::from_secs(1), |_ctx| {}).unwrap();

    let first = sim.destroy().unwrap();
    assert_eq!(first.hooks_run, 3);
    assert_eq!(first.discarded_events, 1);
    assert!(sim.destroy().is_none());
    assert_eq!(*calls.borrow(), vec![0, 1, 2]);
    assert_eq!(sim.pending_count(), 0);
}

#[test]
fn clock_handle_outlives_the_run_loop_borrow() {
    struct Sampler<C: TimeSource> {
        clock: C,
        samples: Vec<SimTime>,
    }

    let mut sim = Simulation::new();
    let sampler = Rc::new(RefCell::new(Sampler {
        clock: sim.clock(),
        samples: Vec::new(),
    }));

    for at in [1, 4, 9] {
        let sampler = Rc::clone(&sampler);
        sim.schedule_at(SimTime::from_secs(at), move |_ctx| {
            let mut s = sampler.borrow_mut();
            let now = s.clock.now();
            s.samples.push(now);
        })
        .unwrap();
    }
    sim.run().unwrap();

    let clock: ClockHandle = sampler.borrow().clock.clone();
    assert_eq!(
        sampler.borrow().samples,
        vec![SimTime::from_secs(1), SimTime::from_secs(4), SimTime::from_secs(9)]
    );
    assert_eq!(clock.now(), sim.now());
}

fn echo_scenario(config: &SimConfig) -> ExecutionTrace {
    let mut sim = Simulation::from_config(config).unwrap();
    for client in 0..3u64 {
        sim.schedule_periodic(
            Periodic::every(SimDuration::from_millis(100))
                .starting_in(SimDuration::from_secs(2 + client as i64))
                .until(SimTime::from_secs(10 + client))
                .max_runs(4),
            |ctx| {
                ctx.schedule(SimDuration::from_millis(2), |_ctx| {}).map(|_| ())
            },
        )
        .unwrap();
    }
    sim.run().unwrap();
    sim.take_trace().unwrap()
}

#[test]
fn identical_runs_produce_identical_traces() {
    let config = SimConfig::from_toml_str(
        "[run]\nstop_at_secs = 20.0\n[trace]\nenabled = true\ncheckpoint_interval = 4\n",
    )
    .unwrap();

    let a = echo_scenario(&config);
    let b = echo_scenario(&config);
    assert_eq!(a.len(), 3 * 4 * 2);
    assert!(traces_match(&a, &b));
    assert_eq!(a.trace_hash(), b.trace_hash());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo.trace");
    a.export_to_file(&path).unwrap();
    let restored = ExecutionTrace::import_from_file(&path).unwrap();
    assert!(traces_match(&a, &restored));
    assert!(restored.verify_checkpoints());
}
