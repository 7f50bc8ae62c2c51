//! `spur-output`: persistent output for spur kernel runs.
//!
//! | File            | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | `trace.csv`     | one row per agent or component transition             |
//! | `anomalies.csv` | liveness and negative-duration warnings               |
//!
//! [`CsvTraceWriter`] implements [`TraceWriter`]; [`TraceOutputObserver`]
//! drives any `TraceWriter` from a running `spur_sim::Model`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spur_output::{CsvTraceWriter, TraceOutputObserver};
//!
//! let writer = CsvTraceWriter::new(Path::new("./output"))?;
//! let mut obs = TraceOutputObserver::new(writer);
//! model.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvTraceWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TraceOutputObserver;
pub use row::{AnomalyRow, TransitionRow};
pub use writer::TraceWriter;
