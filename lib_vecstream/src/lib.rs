//! # lib_vecstream
//!
//! Client-side building blocks for ingesting a stream of fixed-width `f64`
//! vectors from a single remote source and summarising them batch by batch.
//!
//! Data flows through the crate in one direction:
//!
//! ```text
//! socket bytes -> FrameDecoder -> BatchCoordinator::ingest
//!                                   |-> RateTracker::record_event
//!                                   |-> VectorBatchAccumulator::append
//!                                   `-> (batch full) OutputRow -> RowSink
//! ```
//!
//! The statistics and pipeline modules are always compiled. The connection
//! driver, configuration loading and logging setup are feature gated
//! (`ingestors`, `configs`, `loggers`, or `full` for all of them).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod stats;

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "ingestors")]
pub mod ingestors;
#[cfg(feature = "loggers")]
pub mod loggers;

// Re-export the types most callers need.
pub use error::{IngestError, Result};
pub use pipeline::{BatchCoordinator, CsvFileSink, IngestOutcome, OutputRow, RowSink};
pub use protocol::{Frame, FrameDecoder};
pub use stats::{Clock, MonotonicClock, RateTracker, RunningStats, VectorBatchAccumulator};
