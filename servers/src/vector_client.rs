//! # Vector Client
//!
//! Connects to one vector source, summarises every batch of vectors into a
//! CSV row and runs until the source hangs up or the process is signalled.
//!
//! Settings come from built-in defaults, then `vector_client.json` (or
//! `--config-path`), then `VECSTREAM_*` environment variables and flags.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use lib_vecstream::configs::load_config;
use lib_vecstream::ingestors::{SessionEnd, VectorTcpConfig, VectorTcpIngestor};
use lib_vecstream::loggers::setup_logging;
use lib_vecstream::{BatchCoordinator, CsvFileSink};

mod signals;
use signals::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = load_config()?;
    let _log_guard = setup_logging(&settings.log_dir, &settings.log_level)?;
    tracing::debug!("Resolved settings: {:?}", settings);

    let sink = CsvFileSink::create(&settings.output_path)
        .with_context(|| format!("cannot open output {}", settings.output_path.display()))?;
    let mut coordinator = BatchCoordinator::new(sink, settings.batch_size);
    coordinator.size_hint(settings.expected_width);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    let ingestor = VectorTcpIngestor::new(
        VectorTcpConfig {
            host: settings.host.clone(),
            port: settings.port,
            nodelay: true,
        },
        cancel,
    );
    let outcome = ingestor.run(&mut coordinator).await;

    let pending = coordinator.vectors_seen();
    let mut sink = coordinator.into_sink();
    sink.flush()
        .with_context(|| format!("cannot flush output {}", sink.path().display()))?;

    match outcome {
        Ok(report) => {
            match report.end {
                SessionEnd::RemoteClosed => tracing::info!("Source closed the stream."),
                SessionEnd::Cancelled => tracing::info!("Stopped on request."),
            }
            tracing::info!(
                "{} frames, {} rows written to {}, {} vectors left unsummarised",
                report.frames,
                sink.rows_written(),
                sink.path().display(),
                pending
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingestion stopped: {}", e);
            Err(e.into())
        }
    }
}
