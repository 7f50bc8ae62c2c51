//! `TraceOutputObserver<W>`: bridges `KernelObserver` to a `TraceWriter`.

use spur_core::SimTime;
use spur_sim::{Anomaly, KernelObserver, RunOutcome, TraceRecord};

use crate::row::{AnomalyRow, TransitionRow};
use crate::writer::TraceWriter;
use crate::{OutputError, OutputResult};

/// A [`KernelObserver`] that streams every transition and anomaly to a
/// [`TraceWriter`] and flushes it when the run ends.
///
/// Observer callbacks cannot fail, so write errors are stored; check
/// [`take_error`][Self::take_error] after the run returns.  A paused run
/// does not flush; call [`finish`][Self::finish] if the model is dropped
/// while paused.
pub struct TraceOutputObserver<W: TraceWriter> {
    writer:     W,
    rows:       u64,
    last_error: Option<OutputError>,
}

impl<W: TraceWriter> TraceOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0, last_error: None }
    }

    /// The first write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Rows successfully handed to the writer.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn finish(&mut self) -> OutputResult<()> {
        self.writer.finish()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        match result {
            Ok(()) => self.rows += 1,
            // Keep only the first error.
            Err(e) => {
                if self.last_error.is_none() {
                    self.last_error = Some(e);
                }
            }
        }
    }
}

impl<W: TraceWriter> KernelObserver for TraceOutputObserver<W> {
    fn on_transition(&mut self, record: &TraceRecord) {
        let result = self.writer.write_transition(&TransitionRow::from(record));
        self.store_err(result);
    }

    fn on_anomaly(&mut self, anomaly: &Anomaly) {
        let result = self.writer.write_anomaly(&AnomalyRow::from(anomaly));
        self.store_err(result);
    }

    fn on_run_end(&mut self, _time: SimTime, _outcome: RunOutcome) {
        if let Err(e) = self.writer.finish() {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}
