//! # Ingestion Errors
//!
//! A single error type covers the whole decode -> accumulate -> flush cycle.
//! None of these are retried: every variant means the current connection is
//! finished and the caller decides what happens next.

use std::io;
use thiserror::Error;

/// Errors raised while decoding, accumulating or emitting vector batches.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The byte stream failed or closed in the middle of a frame.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The decoder was called again after a failed or interrupted read.
    #[error("Transport error: frame decoder is unusable after an earlier failure")]
    DecoderUnusable,

    /// A length prefix that does not fit in memory on this platform.
    #[error("Transport error: declared frame length {declared} cannot be buffered")]
    FrameTooLarge { declared: u64 },

    /// Payload length is not a whole number of `f64` values.
    #[error("Malformed payload: {len} bytes is not a whole multiple of 8")]
    MalformedPayload { len: usize },

    /// Vector width differs from the width established earlier in the batch.
    #[error("Width mismatch: got {got} values, expected {expected}")]
    WidthMismatch { got: usize, expected: usize },

    /// The output sink could not append a row.
    #[error("Output sink error: {0}")]
    Sink(#[source] io::Error),
}

impl IngestError {
    /// True for every variant that belongs to the transport class.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            IngestError::Transport(_) | IngestError::DecoderUnusable | IngestError::FrameTooLarge { .. }
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, IngestError>;
