//! The `TraceWriter` trait implemented by output backends.

use crate::{AnomalyRow, OutputResult, TransitionRow};

/// A sink for trace and anomaly rows.
///
/// [`TraceOutputObserver`][crate::TraceOutputObserver] swallows errors and
/// keeps the first one for later inspection.
pub trait TraceWriter {
    fn write_transition(&mut self, row: &TransitionRow) -> OutputResult<()>;

    fn write_anomaly(&mut self, row: &AnomalyRow) -> OutputResult<()>;

    /// Flush all underlying handles.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
