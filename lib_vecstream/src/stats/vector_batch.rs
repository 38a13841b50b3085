use crate::error::{IngestError, Result};

use super::running_stats::RunningStats;

/// Size in bytes of one encoded vector element.
pub const VALUE_WIDTH: usize = std::mem::size_of::<f64>();

/// Collects fixed-width vectors for one batch.
///
/// Values are stored contiguously, one vector after another, so dimension `d`
/// is the strided column starting at offset `d` with stride `vector_width`.
/// The first vector appended after construction or `reset` fixes the width for
/// the rest of the batch.
///
/// Invariant: `data.len() == vector_width * vectors_seen`.
#[derive(Debug, Clone, Default)]
pub struct VectorBatchAccumulator {
    data: Vec<f64>,
    vector_width: usize,
    vectors_seen: usize,
    // Scratch space handed out by `stats()`; reused across calls.
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl VectorBatchAccumulator {
    /// An empty accumulator with no width established.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves storage for a batch of `expected_batch_size` vectors of
    /// `expected_width` values. Does not establish the width.
    pub fn size_hint(&mut self, expected_width: usize, expected_batch_size: usize) {
        self.data
            .reserve(expected_width.saturating_mul(expected_batch_size));
        self.means.reserve(expected_width);
        self.stddevs.reserve(expected_width);
    }

    /// Decodes `payload` as packed native-endian `f64` values and appends them
    /// as one vector. Returns the number of vectors now in the batch.
    ///
    /// On error the accumulator is left exactly as it was.
    pub fn append(&mut self, payload: &[u8]) -> Result<usize> {
        if payload.len() % VALUE_WIDTH != 0 {
            return Err(IngestError::MalformedPayload { len: payload.len() });
        }
        let count = payload.len() / VALUE_WIDTH;

        if self.vectors_seen > 0 && count != self.vector_width {
            return Err(IngestError::WidthMismatch {
                got: count,
                expected: self.vector_width,
            });
        }
        self.vector_width = count;

        self.data.extend(payload.chunks_exact(VALUE_WIDTH).map(|chunk| {
            let mut raw = [0u8; VALUE_WIDTH];
            raw.copy_from_slice(chunk);
            f64::from_ne_bytes(raw)
        }));
        self.vectors_seen += 1;
        Ok(self.vectors_seen)
    }

    /// Per-dimension `(means, stddevs)`, each of length `vector_width` and
    /// ordered by dimension index.
    ///
    /// The slices borrow internal scratch buffers, so they stay valid only
    /// until the next call that takes `&mut self`.
    pub fn stats(&mut self) -> (&[f64], &[f64]) {
        self.means.clear();
        self.stddevs.clear();

        let width = self.vector_width;
        if width > 0 {
            for dim in 0..width {
                let column = self.data[dim..].iter().step_by(width).copied();
                let (mean, std) = column.collect::<RunningStats>().result();
                self.means.push(mean);
                self.stddevs.push(std);
            }
        }
        (&self.means, &self.stddevs)
    }

    /// Empties the batch and forgets the established width.
    pub fn reset(&mut self) {
        self.data.clear();
        self.vector_width = 0;
        self.vectors_seen = 0;
    }

    /// Width established by the first vector of the batch (`0` when unset).
    pub fn vector_width(&self) -> usize {
        self.vector_width
    }

    /// Vectors appended since the last reset.
    pub fn vectors_seen(&self) -> usize {
        self.vectors_seen
    }

    /// True when no vector has been appended since the last reset.
    pub fn is_empty(&self) -> bool {
        self.vectors_seen == 0
    }
}
