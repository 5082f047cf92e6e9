//! Transport contract
//!
//! A transport carries one request body to the server and hands back the
//! matching reply body. Framing, sockets and request pairing live here;
//! the protocol layer only ever sees bodies.
//!
//! ## Frame Format (IPROTO)
//! ```text
//! ┌──────────┬──────────┬───────────────┬─────────────────────┐
//! │ Type (4) │ Len (4)  │ Request ID (4)│        Body         │
//! └──────────┴──────────┴───────────────┴─────────────────────┘
//! ```
//! Requests and replies share this header; a reply echoes the type and
//! request id of the request it answers.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes};
use thiserror::Error;

use crate::protocol::RequestType;

/// Header size: type + body length + request id
pub const HEADER_SIZE: usize = 12;

/// Failures of the transport collaborator
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connect to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Reply too large: {size} bytes (max {max})")]
    ReplyTooLarge { size: u32, max: u32 },

    #[error("Connection closed by server")]
    Closed,
}

/// Blocking request/response primitive
///
/// Implementations must pair each reply with its request even when
/// `exchange` is called from several threads at once.
pub trait Transport: Send + Sync {
    /// Send `body` as a request of type `request_type` and wait for the reply body
    fn exchange(&self, request_type: RequestType, body: &[u8]) -> Result<Bytes, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn exchange(&self, request_type: RequestType, body: &[u8]) -> Result<Bytes, TransportError> {
        (**self).exchange(request_type, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(&self, request_type: RequestType, body: &[u8]) -> Result<Bytes, TransportError> {
        (**self).exchange(request_type, body)
    }
}

// =============================================================================
// Frame Header
// =============================================================================

/// IPROTO frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub request_type: u32,
    pub body_len: u32,
    pub request_id: u32,
}

impl FrameHeader {
    /// Encode the header into its 12 wire bytes
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut buf = &mut out[..];
        buf.put_u32_le(self.request_type);
        buf.put_u32_le(self.body_len);
        buf.put_u32_le(self.request_id);
        out
    }

    /// Decode a header from its 12 wire bytes
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            request_type: buf.get_u32_le(),
            body_len: buf.get_u32_le(),
            request_id: buf.get_u32_le(),
        }
    }
}
