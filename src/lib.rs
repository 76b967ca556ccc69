//! # Kairos: Deterministic Discrete-Event Simulation Kernel
//!
//! A single simulated clock, a time-ordered queue of pending actions, and a
//! run loop that pops the earliest action, advances the clock to its time
//! and executes it. Actions may schedule further actions, cancel pending
//! ones, or stop the run. Two runs that schedule the same work in the same
//! order execute it in the same order.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │       Simulation          │ ← run loop, stop conditions, teardown
//! │  ┌────────────────────┐  │
//! │  │     Scheduler       │  │ ← (time, id) min-heap + live set
//! │  └────────────────────┘  │
//! │  ┌────────────────────┐  │
//! │  │     TaskTable       │  │ ← periodic tasks
//! │  └────────────────────┘  │
//! │  ┌────────────────────┐  │
//! │  │ SimTime / Clock     │  │ ← simulated clock
//! │  └────────────────────┘  │
//! └──────────────────────────┘
//!        │ SimContext           handed to every action
//! ```
//!
//! ```rust
//! use kairos::{SimDuration, Simulation};
//!
//! let mut sim = Simulation::new();
//! sim.schedule(SimDuration::from_secs(1), |ctx| {
//!     println!("{} hello", ctx.now());
//! })
//! .unwrap();
//! sim.run().unwrap();
//! sim.destroy();
//! ```

pub mod action;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
mod scheduler;
pub mod simulation;
pub mod stop;
pub mod task;
pub mod time;
pub mod trace;

// Re-exports for convenience.
pub use action::{ActionResult, BoxError, IntoActionResult};
pub use clock::{ClockHandle, TimeSource};
pub use config::SimConfig;
pub use error::{ActionFault, ConfigError, FaultKind, SimError, SimResult};
pub use event::{EventHandle, EventId};
pub use simulation::{DestroyReport, SimContext, Simulation};
pub use stop::{Progress, RunOutcome, RunSummary};
pub use task::{Periodic, TaskHandle, TaskId};
pub use time::{SimDuration, SimTime};
pub use trace::{traces_match, Checkpoint, ExecutionTrace, Origin, TraceEntry};
