//! Field codec
//!
//! Every value sent to the server is written as a length-prefixed field:
//!
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ Len (varint) │         Payload             │
//! └──────────────┴─────────────────────────────┘
//! ```
//!
//! - `i32`: varint(4) + 4 bytes little-endian
//! - `i8`:  varint(1) + 1 byte
//! - `i64`: varint(8) + 8 bytes little-endian
//! - byte strings: varint(len) + raw bytes, no terminator
//!
//! Decoding goes the other way only from an already-delimited slice: the
//! length prefix is consumed by the response parser and never seen here.

use std::io::{self, Write};

use bytes::Bytes;

use crate::error::{BoxError, Result};
use super::codec::encode_varint;

// =============================================================================
// Encoding
// =============================================================================

/// A value that can write itself into a request body
///
/// Implement this for custom types (arrays, packed records, ...) to pass them
/// anywhere a built-in field is accepted. The only failure is a failure of
/// the sink itself.
pub trait Field {
    /// Write the length prefix and payload for this value
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()>;
}

impl<T: Field + ?Sized> Field for &T {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        (**self).encode(sink)
    }
}

impl<T: Field + ?Sized> Field for Box<T> {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        (**self).encode(sink)
    }
}

/// Write a varint length prefix followed by `payload`
pub fn write_field(sink: &mut dyn Write, payload: &[u8]) -> io::Result<()> {
    let mut prefix = Vec::with_capacity(10);
    encode_varint(payload.len() as u64, &mut prefix);
    sink.write_all(&prefix)?;
    sink.write_all(payload)
}

impl Field for i32 {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        write_field(sink, &self.to_le_bytes())
    }
}

impl Field for i8 {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        write_field(sink, &self.to_le_bytes())
    }
}

impl Field for i64 {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        write_field(sink, &self.to_le_bytes())
    }
}

impl Field for str {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        write_field(sink, self.as_bytes())
    }
}

impl Field for String {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        self.as_str().encode(sink)
    }
}

impl Field for [u8] {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        write_field(sink, self)
    }
}

impl Field for Vec<u8> {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        self.as_slice().encode(sink)
    }
}

impl Field for Bytes {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        write_field(sink, self)
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// A value that can be read back from one raw tuple field
pub trait FromField: Sized {
    /// Decode from the field payload (length prefix already stripped)
    fn from_field(raw: &[u8]) -> Result<Self>;
}

fn fixed<const N: usize>(raw: &[u8], type_name: &str) -> Result<[u8; N]> {
    raw.try_into().map_err(|_| {
        BoxError::Decode(format!(
            "{}: expected {} bytes, got {}",
            type_name,
            N,
            raw.len()
        ))
    })
}

impl FromField for i32 {
    fn from_field(raw: &[u8]) -> Result<Self> {
        Ok(i32::from_le_bytes(fixed(raw, "i32")?))
    }
}

impl FromField for i8 {
    fn from_field(raw: &[u8]) -> Result<Self> {
        Ok(i8::from_le_bytes(fixed(raw, "i8")?))
    }
}

impl FromField for i64 {
    fn from_field(raw: &[u8]) -> Result<Self> {
        Ok(i64::from_le_bytes(fixed(raw, "i64")?))
    }
}

/// Lossy: invalid UTF-8 sequences become U+FFFD
impl FromField for String {
    fn from_field(raw: &[u8]) -> Result<Self> {
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

impl FromField for Vec<u8> {
    fn from_field(raw: &[u8]) -> Result<Self> {
        Ok(raw.to_vec())
    }
}

impl FromField for Bytes {
    fn from_field(raw: &[u8]) -> Result<Self> {
        Ok(Bytes::copy_from_slice(raw))
    }
}
