//! # Vector TCP Ingestor
//!
//! Connects to one vector source and runs the decode -> ingest loop until the
//! source hangs up, something fails, or the cancellation token fires.
//! There is no reconnect; the caller decides what to do with the outcome.

use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::pipeline::{BatchCoordinator, RowSink};
use crate::protocol::FrameDecoder;
use crate::stats::Clock;

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorTcpConfig {
    /// Host name or IP address of the source.
    pub host: String,
    /// TCP port of the source.
    pub port: u16,
    /// Disable Nagle's algorithm on the socket.
    pub nodelay: bool,
}

impl Default for VectorTcpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            nodelay: true,
        }
    }
}

/// Why a session stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The source closed the connection between two frames.
    RemoteClosed,
    /// The cancellation token fired.
    Cancelled,
}

/// Totals for one finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Frames fully decoded.
    pub frames: u64,
    /// Batches written to the sink during the session.
    pub batches_flushed: u64,
    /// How the session ended.
    pub end: SessionEnd,
}

/// Single-connection client for a vector source.
pub struct VectorTcpIngestor {
    config: VectorTcpConfig,
    cancel: CancellationToken,
}

impl VectorTcpIngestor {
    /// Creates an ingestor that stops when `cancel` fires.
    pub fn new(config: VectorTcpConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// A handle that can stop this ingestor from any task or thread.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Connects and drives `coordinator` until the session ends.
    pub async fn run<S, C>(&self, coordinator: &mut BatchCoordinator<S, C>) -> Result<SessionReport>
    where
        S: RowSink,
        C: Clock,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        tracing::info!("Connecting to {}", addr);

        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::info!("Cancelled while connecting to {}", addr);
                return Ok(SessionReport { frames: 0, batches_flushed: 0, end: SessionEnd::Cancelled });
            }
            res = TcpStream::connect(addr.as_str()) => match res {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!("connect to {} failed: {}", addr, e);
                    return Err(e.into());
                }
            },
        };

        if self.config.nodelay {
            stream.set_nodelay(true)?;
        }
        match stream.local_addr() {
            Ok(local) => tracing::info!("Connected to {} from {}", addr, local),
            Err(_) => tracing::info!("Connected to {}", addr),
        }

        let report = drive_stream(stream, coordinator, &self.cancel).await?;
        tracing::info!(
            "Closing the connection to {}: {:?} after {} frames, {} batches",
            addr,
            report.end,
            report.frames,
            report.batches_flushed
        );
        Ok(report)
    }
}

/// Runs the decode -> ingest loop over any byte stream.
///
/// Cancellation is checked before every read and also interrupts a read that
/// is already waiting for bytes. Errors from the decoder or the coordinator
/// end the session and are returned unchanged.
pub async fn drive_stream<R, S, C>(
    reader: R,
    coordinator: &mut BatchCoordinator<S, C>,
    cancel: &CancellationToken,
) -> Result<SessionReport>
where
    R: AsyncRead + Unpin,
    S: RowSink,
    C: Clock,
{
    let mut decoder = FrameDecoder::new(reader);
    let flushed_before = coordinator.batches_flushed();

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break SessionEnd::Cancelled,
            next = decoder.next_frame() => next,
        };

        match next {
            Ok(Some(frame)) => {
                if let Err(e) = coordinator.ingest(frame.as_bytes()) {
                    tracing::error!("ingest failed after {} frames: {}", decoder.frames_decoded(), e);
                    return Err(e);
                }
            }
            Ok(None) => {
                tracing::warn!("Stream closed by remote host.");
                break SessionEnd::RemoteClosed;
            }
            Err(e) => {
                tracing::error!("read failed after {} frames: {}", decoder.frames_decoded(), e);
                return Err(e);
            }
        }
    };

    Ok(SessionReport {
        frames: decoder.frames_decoded(),
        batches_flushed: coordinator.batches_flushed() - flushed_before,
        end,
    })
}
