use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = std::mem::size_of::<u64>();

/// One decoded protocol unit. `payload.len() == declared_length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Body length as read from the header.
    pub declared_length: u64,
    /// Raw body bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Body as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}

/// Encodes `values` as one complete frame (header + packed doubles).
pub fn encode_vector(values: &[f64]) -> Bytes {
    let body_len = values.len() * std::mem::size_of::<f64>();
    let mut buf = BytesMut::with_capacity(HEADER_LEN + body_len);
    buf.put_slice(&(body_len as u64).to_ne_bytes());
    for value in values {
        buf.put_slice(&value.to_ne_bytes());
    }
    buf.freeze()
}

/// Writes `values` as one frame to `writer`.
pub async fn write_vector<W>(writer: &mut W, values: &[f64]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_vector(values)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode_vector(&[1.5, -2.0]);
        assert_eq!(frame.len(), HEADER_LEN + 16);

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&frame[..HEADER_LEN]);
        assert_eq!(u64::from_ne_bytes(header), 16);
        assert_eq!(&frame[HEADER_LEN..HEADER_LEN + 8], &1.5f64.to_ne_bytes());
        assert_eq!(&frame[HEADER_LEN + 8..], &(-2.0f64).to_ne_bytes());
    }

    #[test]
    fn test_encode_empty_vector_is_header_only() {
        let frame = encode_vector(&[]);
        assert_eq!(&frame[..], &0u64.to_ne_bytes());
    }
}
