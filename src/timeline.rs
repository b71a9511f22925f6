//! The virtual clock: a global, strictly ordered event queue.
//!
//! Events fire in timestamp order; events sharing a timestamp fire in the
//! order they were scheduled (stable FIFO tie-break). Scheduling is
//! non-blocking and events are never cancelled: once scheduled, an event
//! always fires, and receivers are expected to ignore anything obsolete.

use std::collections::BTreeMap;

use crate::event::Event;
use crate::types::Time;

/// The global virtual clock and its pending events.
///
/// The queue key is `(time, insertion sequence)`, which makes iteration
/// order the delivery order and keeps same-time events FIFO.
#[derive(Debug, Default)]
pub struct Timeline {
    now: Time,
    queue: BTreeMap<(Time, u64), Event>,
    insertions: u64,
    events_processed: u64,
    peak_queue_depth: usize,
}

impl Timeline {
    /// Creates an empty timeline at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Time {
        self.now
    }

    /// Number of pending events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total events popped so far.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Largest queue depth observed.
    pub fn peak_queue_depth(&self) -> usize {
        self.peak_queue_depth
    }

    /// Schedules an event.
    ///
    /// An event timed before the current virtual time is clamped to fire
    /// immediately; that only happens on a caller bug and is logged.
    pub fn schedule(&mut self, mut event: Event) {
        if event.time < self.now {
            tracing::warn!(
                event_time = event.time,
                now = self.now,
                target = %event.target,
                "event scheduled in the past, clamping to now"
            );
            event.time = self.now;
        }
        self.queue.insert((event.time, self.insertions), event);
        self.insertions += 1;
        self.peak_queue_depth = self.peak_queue_depth.max(self.queue.len());
    }

    /// Pops the next event due at or before `target`, advancing the clock
    /// to the event's timestamp.
    ///
    /// Returns `None` once no pending event is due by `target`; the clock
    /// is left at the last popped event's time (use [`Timeline::advance_to`]
    /// to close the gap).
    pub fn pop_due(&mut self, target: Time) -> Option<Event> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > target {
            return None;
        }
        let event = self.queue.remove(&key)?;
        self.now = event.time;
        self.events_processed += 1;
        Some(event)
    }

    /// Advances the clock to `target` if it is ahead of the current time.
    pub fn advance_to(&mut self, target: Time) {
        self.now = self.now.max(target);
    }
}
