//! # Data Ingestors Module
//!
//! Connection drivers that feed a `BatchCoordinator` from a remote source.
//! Each driver owns the transport side of the cycle: connect, pull frames
//! with a `FrameDecoder`, hand each payload to the coordinator, and stop on
//! remote close, error or cancellation.
//!
//! ## Contained Modules:
//! - **`vector_tcp`**: Single-connection TCP client for the length-prefixed
//!   vector protocol.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The TCP client for length-prefixed vector streams.
pub mod vector_tcp;

// --- Public API Re-exports ---
pub use vector_tcp::{drive_stream, SessionEnd, SessionReport, VectorTcpConfig, VectorTcpIngestor};
