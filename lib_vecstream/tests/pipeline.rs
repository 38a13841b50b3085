//! End-to-end checks of the batch pipeline through the public API.

use std::fs;
use std::time::Duration;

use approx::assert_relative_eq;
use lib_vecstream::ingestors::{drive_stream, SessionEnd};
use lib_vecstream::protocol::{encode_vector, write_vector, HEADER_LEN};
use lib_vecstream::stats::ManualClock;
use lib_vecstream::{
    BatchCoordinator, CsvFileSink, IngestError, IngestOutcome, OutputRow, RateTracker, RunningStats,
    VectorBatchAccumulator,
};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

fn payload(values: &[f64]) -> Vec<u8> {
    encode_vector(values)[HEADER_LEN..].to_vec()
}

fn ramp(i: usize) -> [f64; 3] {
    let i = i as f64;
    [i, i * 2.0, i * 3.0]
}

#[test]
fn test_hundred_vectors_at_hundred_hertz() {
    let clock = ManualClock::new();
    let mut coord = BatchCoordinator::with_clock(Vec::<OutputRow>::new(), 100, clock.clone());

    let mut flushed = None;
    for i in 1..=100 {
        if i > 1 {
            clock.advance(Duration::from_millis(10));
        }
        match coord.ingest(&payload(&ramp(i))).unwrap() {
            IngestOutcome::Flushed(row) => flushed = Some((i, row)),
            IngestOutcome::Accumulated { vectors_seen } => assert_eq!(vectors_seen, i),
        }
    }

    let (at, row) = flushed.expect("no row after 100 vectors");
    assert_eq!(at, 100);
    assert_eq!(coord.sink().len(), 1);

    assert_relative_eq!(row.dim_means[0], 50.5, epsilon = 1e-9);
    assert_relative_eq!(row.dim_means[1], 101.0, epsilon = 1e-9);
    assert_relative_eq!(row.dim_means[2], 151.5, epsilon = 1e-9);
    // Population stddev of 1..=100 is sqrt((100^2 - 1) / 12).
    let base_std = ((100.0f64 * 100.0 - 1.0) / 12.0).sqrt();
    for (d, std) in row.dim_stddevs.iter().enumerate() {
        assert_relative_eq!(*std, base_std * (d + 1) as f64, epsilon = 1e-6);
    }

    assert_eq!(row.rate_samples.len(), 100);
    assert_eq!(row.rate_samples[0], 0.0);
    let steady: RunningStats = row.rate_samples[1..].iter().copied().collect();
    assert_relative_eq!(steady.mean(), 100.0, epsilon = 1e-6);
    // The leading zero sample pulls the batch mean down by one percent.
    assert_relative_eq!(row.rate_mean, 99.0, epsilon = 1e-6);

    assert_eq!(coord.vectors_seen(), 0);
    assert!(coord.rate_samples().is_empty());
}

#[test]
fn test_odd_payload_leaves_batch_as_it_was() {
    let mut coord = BatchCoordinator::new(Vec::<OutputRow>::new(), 10);
    coord.ingest(&payload(&[1.0, 2.0, 3.0])).unwrap();
    coord.ingest(&payload(&[4.0, 5.0, 6.0])).unwrap();

    let err = coord.ingest(&[0u8; 17]).unwrap_err();
    assert!(matches!(err, IngestError::MalformedPayload { len: 17 }));
    assert_eq!(coord.vectors_seen(), 2);
    assert_eq!(coord.vector_width(), 3);

    // The batch is still usable by the same coordinator.
    coord.ingest(&payload(&[7.0, 8.0, 9.0])).unwrap();
    assert_eq!(coord.vectors_seen(), 3);
}

#[test]
fn test_reset_matches_fresh_instances() {
    let mut used = VectorBatchAccumulator::new();
    used.append(&payload(&[1.0, 2.0])).unwrap();
    used.append(&payload(&[3.0, 4.0])).unwrap();
    used.reset();

    let mut fresh = VectorBatchAccumulator::new();
    assert_eq!(used.vectors_seen(), fresh.vectors_seen());
    assert_eq!(used.vector_width(), fresh.vector_width());
    assert_eq!(used.stats(), fresh.stats());
    // A different width is accepted after reset.
    used.append(&payload(&[1.0, 2.0, 3.0])).unwrap();
    assert_eq!(used.vector_width(), 3);

    let clock = ManualClock::new();
    let mut rate = RateTracker::with_clock(clock.clone());
    rate.record_event();
    clock.advance(Duration::from_millis(250));
    rate.record_event();
    rate.reset();
    assert!(rate.is_empty());
    assert_eq!(rate.result(), (0.0, 0.0));

    clock.advance(Duration::from_secs(3));
    rate.record_event();
    assert_eq!(rate.samples(), &[0.0]);
}

#[tokio::test]
async fn test_stream_to_csv_file() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let out = dir.path().join("nested").join("out.csv");

    let (mut tx, rx) = tokio::io::duplex(4096);
    tokio::spawn(async move {
        for i in 1..=7 {
            write_vector(&mut tx, &ramp(i)).await.unwrap();
        }
        tx.shutdown().await.unwrap();
    });

    let sink = CsvFileSink::create(&out).unwrap();
    let mut coord = BatchCoordinator::new(sink, 3);
    coord.size_hint(3);
    let report = drive_stream(rx, &mut coord, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.end, SessionEnd::RemoteClosed);
    assert_eq!(report.frames, 7);
    assert_eq!(report.batches_flushed, 2);
    // The trailing partial batch is never written.
    assert_eq!(coord.vectors_seen(), 1);

    let mut sink = coord.into_sink();
    sink.flush().unwrap();
    assert_eq!(sink.rows_written(), 2);

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        // 3 samples, mean, stddev, 3 means, 3 stddevs
        assert_eq!(line.split(',').count(), 11);
        assert!(!line.ends_with(','));
    }

    let second: Vec<f64> = lines[1].split(',').map(|f| f.parse().unwrap()).collect();
    assert_eq!(&second[5..8], &[5.0, 10.0, 15.0]);
}
