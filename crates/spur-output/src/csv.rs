//! CSV output backend.
//!
//! Creates `trace.csv` and `anomalies.csv` in the configured directory.
//! Optional fields are written as empty cells.

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::writer::TraceWriter;
use crate::{AnomalyRow, OutputResult, TransitionRow};

pub struct CsvTraceWriter {
    trace:     Writer<File>,
    anomalies: Writer<File>,
    finished:  bool,
}

impl CsvTraceWriter {
    /// Create (truncating) both files in `dir` and write their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut trace = WriterBuilder::new().has_headers(false).from_path(dir.join("trace.csv"))?;
        trace.write_record(["time", "event", "agent", "component", "kind"])?;

        let mut anomalies =
            WriterBuilder::new().has_headers(false).from_path(dir.join("anomalies.csv"))?;
        anomalies.write_record([
            "time",
            "kind",
            "agents",
            "components",
            "cyclic",
            "blocked_since",
            "raw_secs",
        ])?;

        Ok(Self { trace, anomalies, finished: false })
    }
}

impl TraceWriter for CsvTraceWriter {
    fn write_transition(&mut self, row: &TransitionRow) -> OutputResult<()> {
        self.trace.serialize(row)?;
        Ok(())
    }

    fn write_anomaly(&mut self, row: &AnomalyRow) -> OutputResult<()> {
        self.anomalies.serialize(row)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trace.flush()?;
        self.anomalies.flush()?;
        Ok(())
    }
}
