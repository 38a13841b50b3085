//! # Wire Protocol
//!
//! Length-prefixed framing used between a vector source and this client.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────┐
//! │ Length (8 bytes)     │ Payload (Length bytes)           │
//! │ native-endian u64    │ packed native-endian f64 values  │
//! └──────────────────────┴──────────────────────────────────┘
//! ```
//!
//! Both ends are assumed to share a byte order. There is no checksum and no
//! resynchronisation marker: a corrupted length prefix desynchronises every
//! frame that follows it, and nothing here can detect that.

/// Frame type and encoding helpers for the sending side.
pub mod frame;
/// Two-phase async decoder for the receiving side.
pub mod frame_decoder;

pub use frame::{encode_vector, write_vector, Frame, HEADER_LEN};
pub use frame_decoder::FrameDecoder;
