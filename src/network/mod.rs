//! Network Module
//!
//! Transport collaborator for the protocol layer.
//!
//! ## Architecture
//! - `Transport` trait: blocking `exchange(type, body) -> reply body`
//! - `TcpTransport`: IPROTO framing over one TCP stream, one exchange at a time

mod transport;
mod tcp;

pub use transport::{FrameHeader, Transport, TransportError, HEADER_SIZE};
pub use tcp::TcpTransport;
