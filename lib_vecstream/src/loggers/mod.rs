//! # Logging Setup
//!
//! Installs the process-wide `tracing` subscriber: console output plus a
//! non-blocking log file per run.

/// Subscriber construction and log directory housekeeping.
pub mod tracing_setup;

pub use tracing_setup::{parse_level, setup_logging, LoggerError};
