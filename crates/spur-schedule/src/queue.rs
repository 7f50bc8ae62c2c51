//! `EventQueue`: the simulation clock.
//!
//! Pending events live in a `BTreeMap` keyed by `(time, seq)`, which is also
//! the dispatch order.  A side index `seq → time` turns a bare
//! [`EventHandle`] back into its map key for cancellation; an entry leaves
//! the index the moment its event is dispatched or cancelled.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use spur_core::SimTime;

use crate::{Event, EventHandle, ScheduleError, ScheduleResult};

/// Single-threaded, deterministic priority queue of timed events.
///
/// Dispatch is synchronous: the caller pops one event with
/// [`advance`](Self::advance), handles it, and only then pops the next.
#[derive(Debug)]
pub struct EventQueue<E> {
    now:        SimTime,
    next_seq:   u64,
    dispatched: u64,
    pending:    BTreeMap<(SimTime, u64), E>,
    index:      HashMap<u64, SimTime>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            now:        SimTime::ZERO,
            next_seq:   0,
            dispatched: 0,
            pending:    BTreeMap::new(),
            index:      HashMap::new(),
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current clock value: the time of the last dispatched event.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `payload` at absolute `time`.
    ///
    /// Fails with [`ScheduleError::PastScheduling`] if `time < now`.
    /// Scheduling *at* `now` is allowed; the event runs after every event
    /// already queued for the same instant.
    pub fn schedule(&mut self, time: SimTime, payload: E) -> ScheduleResult<EventHandle> {
        if time < self.now {
            return Err(ScheduleError::PastScheduling { requested: time, now: self.now });
        }
        Ok(self.insert(time, payload))
    }

    /// Schedule `payload` `delay_secs` after the current clock value.
    #[inline]
    pub fn schedule_in(&mut self, delay_secs: u64, payload: E) -> EventHandle {
        self.insert(self.now + delay_secs, payload)
    }

    fn insert(&mut self, time: SimTime, payload: E) -> EventHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((time, seq), payload);
        self.index.insert(seq, time);
        EventHandle(seq)
    }

    /// Cancel a pending event.
    ///
    /// Returns `false` if the event was already dispatched or cancelled.
    /// Idempotent: cancelling twice is harmless.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.take(handle).is_some()
    }

    /// Cancel a pending event, returning its payload, or fail with
    /// [`ScheduleError::NotPending`].
    pub fn cancel_pending(&mut self, handle: EventHandle) -> ScheduleResult<E> {
        self.take(handle).ok_or(ScheduleError::NotPending(handle))
    }

    fn take(&mut self, handle: EventHandle) -> Option<E> {
        let time = self.index.remove(&handle.0)?;
        self.pending.remove(&(time, handle.0))
    }

    /// `true` if `handle` refers to an event that has not yet run or been
    /// cancelled.
    #[inline]
    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.index.contains_key(&handle.0)
    }

    /// Pop the next event in `(time, seq)` order and advance the clock to its
    /// time.  Returns `None` when the queue is empty; the clock is unchanged.
    pub fn advance(&mut self) -> Option<Event<E>> {
        let ((time, seq), payload) = self.pending.pop_first()?;
        self.index.remove(&seq);
        debug_assert!(time >= self.now, "queue yielded an event in the past");
        self.now = time;
        self.dispatched += 1;
        Some(Event { time, seq, payload })
    }

    /// Time of the next event, or `None` if empty.
    #[inline]
    pub fn peek_time(&self) -> Option<SimTime> {
        self.pending.keys().next().map(|&(time, _)| time)
    }

    /// Number of pending events.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total events dispatched over the lifetime of the queue.
    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Pending events in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = (EventHandle, SimTime, &E)> + '_ {
        self.pending
            .iter()
            .map(|(&(time, seq), payload)| (EventHandle(seq), time, payload))
    }
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

/// Complete queue state: clock value, sequence counter, and every pending
/// event with its original sequence id.
#[derive(Clone, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct QueueSnapshot<E> {
    pub now:        SimTime,
    pub next_seq:   u64,
    pub dispatched: u64,
    pub events:     Vec<Event<E>>,
}

impl<E: Clone> EventQueue<E> {
    /// Capture the queue so that [`restore`](Self::restore) reproduces the
    /// exact same future dispatch order.
    pub fn snapshot(&self) -> QueueSnapshot<E> {
        QueueSnapshot {
            now:        self.now,
            next_seq:   self.next_seq,
            dispatched: self.dispatched,
            events:     self
                .pending
                .iter()
                .map(|(&(time, seq), payload)| Event { time, seq, payload: payload.clone() })
                .collect(),
        }
    }
}

impl<E> EventQueue<E> {
    /// Rebuild a queue from a snapshot.
    ///
    /// Fails if any event predates the snapshot's clock or reuses a sequence
    /// id at or beyond `next_seq`.
    pub fn restore(snapshot: QueueSnapshot<E>) -> ScheduleResult<Self> {
        let mut queue = Self {
            now:        snapshot.now,
            next_seq:   snapshot.next_seq,
            dispatched: snapshot.dispatched,
            pending:    BTreeMap::new(),
            index:      HashMap::with_capacity(snapshot.events.len()),
        };
        for event in snapshot.events {
            if event.time < snapshot.now {
                return Err(ScheduleError::PastScheduling { requested: event.time, now: snapshot.now });
            }
            if event.seq >= snapshot.next_seq || queue.index.contains_key(&event.seq) {
                return Err(ScheduleError::Parse(format!(
                    "snapshot event sequence id {} is not below next_seq {} or is duplicated",
                    event.seq, snapshot.next_seq
                )));
            }
            queue.index.insert(event.seq, event.time);
            queue.pending.insert((event.time, event.seq), event.payload);
        }
        Ok(queue)
    }
}
