//! Observer trait for the dispatched-event trace and anomaly stream.

use crossbeam_channel::{Receiver, Sender, TrySendError};

use spur_core::SimTime;

use crate::{Anomaly, RunOutcome, TraceRecord};

/// Callbacks invoked by [`Model::step`][crate::Model::step] and the run loops.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Records are delivered after the event
/// that produced them has been fully processed, so an observer never sees a
/// half-finished hand-off.
///
/// # Example: hand-off counter
///
/// ```rust,ignore
/// struct Handoffs(usize);
///
/// impl KernelObserver for Handoffs {
///     fn on_transition(&mut self, record: &TraceRecord) {
///         if record.kind == TransitionKind::Vacated {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait KernelObserver {
    /// Called for every agent or component transition, in dispatch order.
    fn on_transition(&mut self, _record: &TraceRecord) {}

    /// Called once for each newly recorded anomaly.
    fn on_anomaly(&mut self, _anomaly: &Anomaly) {}

    /// Called when a run loop stops for good: queue exhausted or end time
    /// reached.  Not called when a run is paused.
    fn on_run_end(&mut self, _time: SimTime, _outcome: RunOutcome) {}
}

/// A [`KernelObserver`] that does nothing.
pub struct NoopObserver;

impl KernelObserver for NoopObserver {}

// ── TraceRecorder ─────────────────────────────────────────────────────────────

/// Keeps every record and anomaly in memory.  Intended for tests and small
/// runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TraceRecorder {
    pub records:   Vec<TraceRecord>,
    pub anomalies: Vec<Anomaly>,
    pub outcome:   Option<(SimTime, RunOutcome)>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KernelObserver for TraceRecorder {
    fn on_transition(&mut self, record: &TraceRecord) {
        self.records.push(record.clone());
    }

    fn on_anomaly(&mut self, anomaly: &Anomaly) {
        self.anomalies.push(anomaly.clone());
    }

    fn on_run_end(&mut self, time: SimTime, outcome: RunOutcome) {
        self.outcome = Some((time, outcome));
    }
}

// ── ChannelObserver ───────────────────────────────────────────────────────────

/// Message forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum KernelMessage {
    Transition(TraceRecord),
    Anomaly(Anomaly),
    RunEnd { time: SimTime, outcome: RunOutcome },
}

/// Forwards the trace to another thread over a bounded channel.
///
/// Sends never block: when the buffer is full or the receiver is gone the
/// message is dropped and counted.
pub struct ChannelObserver {
    tx:      Sender<KernelMessage>,
    dropped: u64,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of a channel holding at most
    /// `capacity` undelivered messages.
    pub fn bounded(capacity: usize) -> (Self, Receiver<KernelMessage>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

    /// Messages discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, msg: KernelMessage) {
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => self.dropped += 1,
        }
    }
}

impl KernelObserver for ChannelObserver {
    fn on_transition(&mut self, record: &TraceRecord) {
        self.send(KernelMessage::Transition(record.clone()));
    }

    fn on_anomaly(&mut self, anomaly: &Anomaly) {
        self.send(KernelMessage::Anomaly(anomaly.clone()));
    }

    fn on_run_end(&mut self, time: SimTime, outcome: RunOutcome) {
        self.send(KernelMessage::RunEnd { time, outcome });
    }
}
