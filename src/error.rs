//! Error types for boxproto
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::network::TransportError;

/// Result type alias using BoxError
pub type Result<T> = std::result::Result<T, BoxError>;

/// Unified error type for boxproto operations
#[derive(Debug, Error)]
pub enum BoxError {
    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    /// A field failed to write itself into the request body
    #[error("Encode error: {0}")]
    Encode(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Response Errors
    // -------------------------------------------------------------------------
    /// The server answered with a nonzero status code
    #[error("Server error {code}: {message}")]
    Server { code: i32, message: String },

    /// The reply declared more tuples than its bytes contained
    #[error("Truncated response: declared {declared} tuples, decoded {decoded}")]
    TruncatedResponse { declared: u32, decoded: u32 },

    /// The reply ended inside a header, a varint or a field payload
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A raw field could not be decoded into the requested type
    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BoxError {
    /// Server status code, if this is a server error
    pub fn code(&self) -> Option<i32> {
        match self {
            BoxError::Server { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True if the failure came from the transport rather than the protocol
    pub fn is_transport(&self) -> bool {
        matches!(self, BoxError::Transport(_))
    }
}
