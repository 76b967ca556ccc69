//! Read-only access to simulated time.
//!
//! Collaborators that need `now()` take a [`TimeSource`] instead of reaching
//! for a global. Inside an action the [`SimContext`](crate::SimContext) is the
//! time source; anything that lives outside the run loop (a trace sink, a
//! mobility model sampled by several actions) can hold a [`ClockHandle`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::time::SimTime;

/// Anything that can report the current simulated time.
pub trait TimeSource {
    fn now(&self) -> SimTime;
}

/// A cloneable, read-only view of a simulation's clock.
///
/// Only the owning `Simulation` writes through the shared cell; handles can
/// be moved into actions or other threads and always observe the latest
/// time the run loop published.
#[derive(Debug, Clone)]
pub struct ClockHandle {
    nanos: Arc<AtomicU64>,
}

impl ClockHandle {
    pub(crate) fn new(start: SimTime) -> Self {
        ClockHandle {
            nanos: Arc::new(AtomicU64::new(start.as_nanos())),
        }
    }

    #[inline]
    pub(crate) fn publish(&self, now: SimTime) {
        self.nanos.store(now.as_nanos(), Ordering::Release);
    }
}

impl TimeSource for ClockHandle {
    #[inline]
    fn now(&self) -> SimTime {
        SimTime::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> SimTime {
        (**self).now()
    }
}
