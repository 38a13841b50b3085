//! # Batch Pipeline
//!
//! Ties the statistics core to an output sink. A `BatchCoordinator` receives
//! decoded payloads one at a time, and every `batch_size` payloads it writes a
//! single summary row and starts a fresh batch.
//!
//! ## Contained Modules:
//! - **`coordinator`**: The accumulate -> summarize -> emit -> reset cycle.
//! - **`output`**: The summary row layout and the sinks it can be written to.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Batch lifecycle driver.
pub mod coordinator;
/// Summary rows and row sinks.
pub mod output;

pub use coordinator::{BatchCoordinator, IngestOutcome, DEFAULT_BATCH_SIZE};
pub use output::{CsvFileSink, OutputRow, RowSink};
