//! Deterministic event queue with lazy cancellation.
//!
//! Uses a `BinaryHeap` with reversed `Ord` on `Event` to act as a min-heap
//! keyed by `(scheduled_at, id)`. Cancellation never touches the heap: the
//! id is dropped from the live set and the stale entry is discarded when it
//! reaches the head.

use std::collections::{BTreeSet, BinaryHeap};

use tracing::trace;

use crate::event::{Event, EventId, EventIdGen, Payload};
use crate::time::SimTime;

/// The kernel's event queue.
///
/// Owns the heap, the set of live (queued, not cancelled) ids and the id
/// generator, so every submission gets a fresh, increasing id.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    queue: BinaryHeap<Event>,
    live: BTreeSet<EventId>,
    id_gen: EventIdGen,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Scheduler {
            queue: BinaryHeap::new(),
            live: BTreeSet::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Queue `payload` at `at`. Callers validate `at` against the clock.
    pub(crate) fn schedule(&mut self, at: SimTime, payload: Payload) -> EventId {
        let id = self.id_gen.next_id();
        trace!(event = %id, at = %at, ?payload, "queued");
        self.queue.push(Event::new(id, at, payload));
        self.live.insert(id);
        id
    }

    /// Tombstone a queued event. Returns `true` if it was still pending.
    pub(crate) fn cancel(&mut self, id: EventId) -> bool {
        let removed = self.live.remove(&id);
        if removed {
            trace!(event = %id, "cancelled");
        }
        removed
    }

    /// Whether `id` is queued and not cancelled.
    pub(crate) fn is_live(&self, id: EventId) -> bool {
        self.live.contains(&id)
    }

    /// Time of the earliest live event, discarding tombstones at the head.
    pub(crate) fn peek_time(&mut self) -> Option<SimTime> {
        while let Some(top) = self.queue.peek() {
            if self.live.contains(&top.id) {
                return Some(top.scheduled_at);
            }
            self.queue.pop();
        }
        None
    }

    /// Pop the earliest live event (earliest time, lowest id).
    pub(crate) fn pop_next(&mut self) -> Option<Event> {
        loop {
            let event = self.queue.pop()?;
            if self.live.remove(&event.id) {
                return Some(event);
            }
        }
    }

    /// Number of live events.
    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Heap entries including tombstones not yet discarded.
    pub(crate) fn queued_entries(&self) -> usize {
        self.queue.len()
    }

    /// Id the next submission will receive.
    pub(crate) fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }

    /// Discard every queued event, returning how many were live.
    pub(crate) fn clear(&mut self) -> usize {
        let discarded = self.live.len();
        self.queue.clear();
        self.live.clear();
        discarded
    }

    /// Drain live events in dispatch order.
    #[cfg(test)]
    pub(crate) fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.live.len());
        while let Some(e) = self.pop_next() {
            events.push(e);
        }
        events
    }
}
