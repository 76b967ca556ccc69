//! Event records for the simulation kernel.
//!
//! Every piece of scheduled work is an `Event` placed on the scheduler's
//! priority queue. The queue orders events by `(scheduled_at, id)`; ids are
//! minted in submission order, so the id doubles as the insertion sequence
//! that breaks ties between events at the same instant.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::task::TaskId;
use crate::time::SimTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// A unique, strictly increasing event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Deterministic, strictly increasing event-id generator.
///
/// Each scheduler owns exactly one, so two runs that submit the same work in
/// the same order mint the same ids.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event id.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next id without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Event Handle ──────────────────────────────────────────────────────

/// Weak handle returned to whoever scheduled an event.
///
/// Holding a handle does not keep the event alive; it only lets the owner
/// cancel the event or ask whether it is still pending. A handle is bound to
/// the simulation that issued it; any other simulation treats it as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    sim: u64,
    id: EventId,
    at: SimTime,
}

impl EventHandle {
    pub(crate) fn new(sim: u64, id: EventId, at: SimTime) -> Self {
        EventHandle { sim, id, at }
    }

    /// Instance id of the issuing simulation.
    pub(crate) fn sim(&self) -> u64 {
        self.sim
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    /// The instant the event was scheduled for.
    pub fn scheduled_at(&self) -> SimTime {
        self.at
    }
}

// ── Payload ───────────────────────────────────────────────────────────

/// What happens when an event is dispatched.
pub(crate) enum Payload {
    /// A one-shot client action.
    Once(Action),
    /// One occurrence of a periodic task; the action lives in the task table.
    Tick(TaskId),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Once(_) => write!(f, "Once(..)"),
            Payload::Tick(task) => write!(f, "Tick({})", task),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A queued event.
#[derive(Debug)]
pub(crate) struct Event {
    pub(crate) id: EventId,
    pub(crate) scheduled_at: SimTime,
    pub(crate) payload: Payload,
}

impl Event {
    pub(crate) fn new(id: EventId, scheduled_at: SimTime, payload: Payload) -> Self {
        Event {
            id,
            scheduled_at,
            payload,
        }
    }

    /// The ordering key; ids are unique so keys never collide.
    #[inline]
    pub(crate) fn key(&self) -> (SimTime, EventId) {
        (self.scheduled_at, self.id)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Event {}

/// Smallest `(scheduled_at, id)` first.
///
/// `BinaryHeap` is a max-heap, so the natural ordering is reversed here.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
