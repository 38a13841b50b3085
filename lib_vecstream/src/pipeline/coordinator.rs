use crate::error::{IngestError, Result};
use crate::stats::{Clock, MonotonicClock, RateTracker, VectorBatchAccumulator};

use super::output::{OutputRow, RowSink};

/// Vectors per batch when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// What a single `ingest` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The vector was added; the batch now holds `vectors_seen` vectors.
    Accumulated {
        /// Vectors in the current batch.
        vectors_seen: usize,
    },
    /// The vector completed the batch and this row was written to the sink.
    Flushed(OutputRow),
}

/// Drives the batch lifecycle: accumulate, and at `batch_size` vectors
/// summarise, emit one row and reset.
///
/// Owns its rate tracker and accumulator outright; one coordinator serves one
/// connection and is used from one task.
pub struct BatchCoordinator<S, C = MonotonicClock> {
    rate: RateTracker<C>,
    vectors: VectorBatchAccumulator,
    sink: S,
    batch_size: usize,
    batches_flushed: u64,
}

impl<S: RowSink> BatchCoordinator<S, MonotonicClock> {
    /// A coordinator timing arrivals with the monotonic system clock.
    ///
    /// `batch_size` is clamped to at least 1.
    pub fn new(sink: S, batch_size: usize) -> Self {
        Self::with_clock(sink, batch_size, MonotonicClock)
    }
}

impl<S: RowSink, C: Clock> BatchCoordinator<S, C> {
    /// A coordinator timing arrivals with `clock`.
    pub fn with_clock(sink: S, batch_size: usize, clock: C) -> Self {
        Self {
            rate: RateTracker::with_clock(clock),
            vectors: VectorBatchAccumulator::new(),
            sink,
            batch_size: batch_size.max(1),
            batches_flushed: 0,
        }
    }

    /// Pre-reserves storage for vectors of `expected_width` values.
    pub fn size_hint(&mut self, expected_width: usize) {
        self.vectors.size_hint(expected_width, self.batch_size);
        self.rate.size_hint(self.batch_size);
    }

    /// Feeds one payload through the batch cycle.
    ///
    /// The arrival is timed before the payload is decoded, so a rejected
    /// payload still counts towards the arrival rate. Decode errors leave the
    /// accumulated vectors untouched and are returned as-is; the caller is
    /// expected to stop using the connection. A sink error is returned after
    /// the batch has been reset, so the next batch starts empty.
    pub fn ingest(&mut self, payload: &[u8]) -> Result<IngestOutcome> {
        self.rate.record_event();
        let vectors_seen = self.vectors.append(payload)?;
        if vectors_seen < self.batch_size {
            return Ok(IngestOutcome::Accumulated { vectors_seen });
        }

        let row = self.summarize();
        tracing::info!(
            "data rate of last {}: {:.2} Hz  std: {:.2} Hz",
            vectors_seen,
            row.rate_mean,
            row.rate_stddev
        );
        // The batch is closed whether or not the sink accepts the row.
        self.rate.reset();
        self.vectors.reset();
        self.sink.append_row(&row).map_err(IngestError::Sink)?;

        self.batches_flushed += 1;
        Ok(IngestOutcome::Flushed(row))
    }

    fn summarize(&mut self) -> OutputRow {
        let (rate_mean, rate_stddev) = self.rate.result();
        let (dim_means, dim_stddevs) = self.vectors.stats();
        OutputRow {
            rate_samples: self.rate.samples().to_vec(),
            rate_mean,
            rate_stddev,
            dim_means: dim_means.to_vec(),
            dim_stddevs: dim_stddevs.to_vec(),
        }
    }

    /// Vectors in the current, not yet flushed batch.
    pub fn vectors_seen(&self) -> usize {
        self.vectors.vectors_seen()
    }

    /// Width established by the current batch (`0` before its first vector).
    pub fn vector_width(&self) -> usize {
        self.vectors.vector_width()
    }

    /// Rate samples recorded in the current batch.
    pub fn rate_samples(&self) -> &[f64] {
        self.rate.samples()
    }

    /// Flush threshold.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Completed batches since construction.
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed
    }

    /// Shared access to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Exclusive access to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the coordinator and returns the sink. A partial batch is dropped.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_vector;
    use crate::protocol::HEADER_LEN;
    use crate::stats::ManualClock;
    use std::io;
    use std::time::Duration;

    fn payload(values: &[f64]) -> Vec<u8> {
        encode_vector(values)[HEADER_LEN..].to_vec()
    }

    struct FailingSink;

    impl RowSink for FailingSink {
        fn append_row(&mut self, _row: &OutputRow) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_flushes_exactly_at_batch_size() {
        let mut coord = BatchCoordinator::new(Vec::<OutputRow>::new(), 3);
        assert_eq!(
            coord.ingest(&payload(&[1.0])).unwrap(),
            IngestOutcome::Accumulated { vectors_seen: 1 }
        );
        coord.ingest(&payload(&[2.0])).unwrap();
        let outcome = coord.ingest(&payload(&[3.0])).unwrap();

        let row = match outcome {
            IngestOutcome::Flushed(row) => row,
            other => panic!("expected a flush, got {other:?}"),
        };
        assert_eq!(row.dim_means, vec![2.0]);
        assert_eq!(row.rate_samples.len(), 3);
        assert_eq!(coord.sink().len(), 1);
        assert_eq!(coord.vectors_seen(), 0);
        assert_eq!(coord.vector_width(), 0);
        assert!(coord.rate_samples().is_empty());
        assert_eq!(coord.batches_flushed(), 1);
    }

    #[test]
    fn test_rate_columns_precede_dimension_columns() {
        let clock = ManualClock::new();
        let mut coord = BatchCoordinator::with_clock(Vec::<OutputRow>::new(), 2, clock.clone());
        coord.ingest(&payload(&[1.0, 5.0])).unwrap();
        clock.advance(Duration::from_millis(500));
        coord.ingest(&payload(&[3.0, 5.0])).unwrap();

        let row = &coord.sink()[0];
        let fields: Vec<f64> = row.fields().collect();
        // samples [0, 2], mean 1, std 1, means [2, 5], stds [1, 0]
        let expected = [0.0, 2.0, 1.0, 1.0, 2.0, 5.0, 1.0, 0.0];
        assert_eq!(fields.len(), expected.len());
        for (got, want) in fields.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{fields:?}");
        }
    }

    #[test]
    fn test_width_can_change_between_batches() {
        let mut coord = BatchCoordinator::new(Vec::<OutputRow>::new(), 1);
        coord.ingest(&payload(&[1.0, 2.0])).unwrap();
        coord.ingest(&payload(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(coord.sink()[0].dim_means.len(), 2);
        assert_eq!(coord.sink()[1].dim_means.len(), 3);
    }

    #[test]
    fn test_decode_errors_propagate_without_touching_batch() {
        let mut coord = BatchCoordinator::new(Vec::<OutputRow>::new(), 10);
        coord.ingest(&payload(&[1.0, 2.0])).unwrap();

        let err = coord.ingest(&payload(&[1.0])).unwrap_err();
        assert!(matches!(err, IngestError::WidthMismatch { got: 1, expected: 2 }));
        let err = coord.ingest(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, IngestError::MalformedPayload { len: 17 }));

        assert_eq!(coord.vectors_seen(), 1);
        assert_eq!(coord.vector_width(), 2);
        assert!(coord.sink().is_empty());
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let mut coord = BatchCoordinator::new(FailingSink, 1);
        let err = coord.ingest(&payload(&[1.0])).unwrap_err();
        assert!(matches!(err, IngestError::Sink(_)));
    }

    #[test]
    fn test_sink_failure_still_closes_the_batch() {
        let mut coord = BatchCoordinator::new(FailingSink, 2);
        coord.ingest(&payload(&[1.0, 2.0])).unwrap();
        assert!(coord.ingest(&payload(&[3.0, 4.0])).is_err());

        assert_eq!(coord.vectors_seen(), 0);
        assert_eq!(coord.vector_width(), 0);
        assert!(coord.rate_samples().is_empty());
        assert_eq!(coord.batches_flushed(), 0);

        // The next batch flushes after exactly `batch_size` vectors again.
        assert_eq!(
            coord.ingest(&payload(&[5.0])).unwrap(),
            IngestOutcome::Accumulated { vectors_seen: 1 }
        );
        assert!(matches!(coord.ingest(&payload(&[6.0])), Err(IngestError::Sink(_))));
        assert_eq!(coord.vectors_seen(), 0);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let coord = BatchCoordinator::new(Vec::<OutputRow>::new(), 0);
        assert_eq!(coord.batch_size(), 1);
    }
}
