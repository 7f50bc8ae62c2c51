//! Timed events and their handles.

use std::fmt;

use serde::{Deserialize, Serialize};

use spur_core::SimTime;

/// Handle returned by [`EventQueue::schedule`][crate::EventQueue::schedule].
///
/// The inner value is the event's sequence id, which is unique for the
/// lifetime of a queue (including across snapshot/restore).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(Serialize, Deserialize)]
pub struct EventHandle(pub u64);

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev#{}", self.0)
    }
}

/// A dispatched (or snapshotted) event.
///
/// While queued the payload is owned by the queue; [`EventQueue::advance`]
/// moves it out to the caller.
///
/// [`EventQueue::advance`]: crate::EventQueue::advance
#[derive(Clone, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Event<E> {
    pub time:    SimTime,
    pub seq:     u64,
    pub payload: E,
}

impl<E> Event<E> {
    #[inline]
    pub fn handle(&self) -> EventHandle {
        EventHandle(self.seq)
    }
}
