use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{IngestError, Result};

use super::frame::{Frame, HEADER_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    AwaitingHeader,
    AwaitingBody { declared: u64 },
    // Peer closed the stream on a frame boundary.
    Closed,
    // A read failed or was dropped part way; the stream position is unknown.
    Failed,
}

/// Pulls length-prefixed frames out of an async byte stream.
///
/// Each call to [`next_frame`](Self::next_frame) runs one full protocol
/// cycle: read the 8-byte header, then read exactly that many body bytes.
/// A read error, a truncated frame, or dropping the `next_frame` future
/// before it completes leaves the decoder unusable; later calls fail with
/// [`IngestError::DecoderUnusable`].
#[derive(Debug)]
pub struct FrameDecoder<R> {
    reader: R,
    state: DecoderState,
    header: [u8; HEADER_LEN],
    frames_decoded: u64,
}

impl<R> FrameDecoder<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps `reader`, starting in the header state.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: DecoderState::AwaitingHeader,
            header: [0; HEADER_LEN],
            frames_decoded: 0,
        }
    }

    /// Decodes the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly between two
    /// frames. A close anywhere inside a frame is a transport error.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.state {
            DecoderState::AwaitingHeader => {}
            DecoderState::Closed => return Ok(None),
            DecoderState::AwaitingBody { .. } | DecoderState::Failed => {
                return Err(IngestError::DecoderUnusable)
            }
        }

        // Stays `Failed` unless every step below succeeds.
        self.state = DecoderState::Failed;

        if !self.read_header().await? {
            self.state = DecoderState::Closed;
            return Ok(None);
        }
        let declared = u64::from_ne_bytes(self.header);
        let len = usize::try_from(declared).map_err(|_| IngestError::FrameTooLarge { declared })?;
        let mut body = Vec::new();
        body.try_reserve_exact(len)
            .map_err(|_| IngestError::FrameTooLarge { declared })?;
        self.state = DecoderState::AwaitingBody { declared };

        // `take` keeps a generous reservation from reading into the next frame.
        let mut body_reader = (&mut self.reader).take(declared);
        while body.len() < len {
            if body_reader.read_buf(&mut body).await? == 0 {
                return Err(IngestError::Transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {} of {len} body bytes", body.len()),
                )));
            }
        }

        self.state = DecoderState::AwaitingHeader;
        self.frames_decoded += 1;
        Ok(Some(Frame {
            declared_length: declared,
            payload: Bytes::from(body),
        }))
    }

    // Fills the header buffer. `false` means EOF before the first header byte.
    async fn read_header(&mut self) -> Result<bool> {
        let mut filled = 0;
        while filled < HEADER_LEN {
            let n = self.reader.read(&mut self.header[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(IngestError::Transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {filled} of {HEADER_LEN} header bytes"),
                )));
            }
            filled += n;
        }
        Ok(true)
    }

    /// Number of complete frames returned so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Shared access to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Gives back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
