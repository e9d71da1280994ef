//! Event queue with deterministic ordering.

use edflow_core::{Event, InvariantViolation};
use edflow_types::SimTime;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for events at the same time)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: SimTime,
    /// Sequence number for deterministic FIFO ordering.
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Order by time first
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Then by sequence (FIFO)
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-ordered queue of pending events and the replication clock.
///
/// Holds no domain knowledge: it orders events and advances time, the runner
/// decides what each event means.
#[derive(Debug, Default)]
pub struct EventScheduler {
    queue: BTreeMap<EventKey, Event>,
    sequence: u64,
    now: SimTime,
}

impl EventScheduler {
    /// Create an empty scheduler with the clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.first_key_value().map(|(key, _)| key.time)
    }

    /// Schedule an event.
    pub fn push(&mut self, time: SimTime, event: Event) -> Result<EventKey, InvariantViolation> {
        if time < self.now {
            return Err(InvariantViolation::EventInPast {
                now: self.now,
                event: time,
            });
        }

        self.sequence += 1;
        let key = EventKey {
            time,
            sequence: self.sequence,
        };
        self.queue.insert(key, event);
        Ok(key)
    }

    /// Pop the earliest event and advance the clock to it.
    ///
    /// Returns `None` once the queue is empty or the earliest event lies
    /// beyond `horizon`; that event stays queued.
    pub fn pop_next(
        &mut self,
        horizon: SimTime,
    ) -> Result<Option<(EventKey, Event)>, InvariantViolation> {
        match self.queue.first_key_value() {
            Some((key, _)) if key.time <= horizon => {}
            _ => return Ok(None),
        }

        let Some((key, event)) = self.queue.pop_first() else {
            return Ok(None);
        };
        if key.time < self.now {
            return Err(InvariantViolation::EventInPast {
                now: self.now,
                event: key.time,
            });
        }

        self.now = key.time;
        Ok(Some((key, event)))
    }

    /// Move the clock forward without dispatching anything.
    ///
    /// Never moves it backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        if self.now < time {
            self.now = time;
        }
    }
}
