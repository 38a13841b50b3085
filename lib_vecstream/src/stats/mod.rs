//! # Streaming Statistics
//!
//! The numeric core of the client. Everything in here is single-threaded and
//! owned by one `BatchCoordinator`, so nothing takes a lock.
//!
//! ## Components:
//!
//! - **`running_stats`**: Welford-style single-pass mean / standard deviation.
//! - **`rate_tracker`**: Inter-arrival frequency of events, built on `RunningStats`.
//! - **`vector_batch`**: Accumulates fixed-width vectors and computes
//!   per-dimension statistics on demand.
//! - **`clock`**: The time source used by the rate tracker, swappable for a
//!   manually advanced clock when replaying or testing.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Time sources for inter-arrival measurements.
pub mod clock;
/// Inter-arrival frequency tracking.
pub mod rate_tracker;
/// Single-pass mean and standard deviation.
pub mod running_stats;
/// Per-dimension statistics over a batch of vectors.
pub mod vector_batch;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use rate_tracker::RateTracker;
pub use running_stats::RunningStats;
pub use vector_batch::{VectorBatchAccumulator, VALUE_WIDTH};
