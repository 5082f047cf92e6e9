//! Response definitions and parsing
//!
//! ## Reply Body Format
//! ```text
//! ┌────────────┬────────────┬──────────────────────────────────────┐
//! │ Status (4) │ Count (4)  │ Tuple*                               │
//! └────────────┴────────────┴──────────────────────────────────────┘
//!
//! Tuple:
//! ┌──────────┬─────────────────┬─────────────────────────────────┐
//! │ Size (4) │ Cardinality (4) │ { Len (varint) │ Payload }*     │
//! └──────────┴─────────────────┴─────────────────────────────────┘
//! ```
//!
//! A nonzero status is followed by the error message instead of a count.
//! Ping replies have no body at all.

use bytes::{Buf, Bytes};

use crate::error::{BoxError, Result};
use super::codec::decode_varint;
use super::field::FromField;
use super::request::{Flags, RequestType};

/// Policy for replies that declare more tuples than their bytes hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Fail with `BoxError::TruncatedResponse`
    #[default]
    Strict,
    /// Return whatever tuples were decoded
    Lenient,
}

/// One record returned by the server
///
/// Fields are opaque until the caller decodes them by position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tuple {
    pub fields: Vec<Bytes>,
}

impl Tuple {
    pub fn new(fields: Vec<Bytes>) -> Self {
        Self { fields }
    }

    /// Number of fields
    pub fn cardinality(&self) -> usize {
        self.fields.len()
    }

    /// Raw bytes of field `index`
    pub fn field(&self, index: usize) -> Option<&[u8]> {
        self.fields.get(index).map(|f| f.as_ref())
    }

    /// Decode field `index` as `T`
    pub fn get<T: FromField>(&self, index: usize) -> Result<T> {
        let raw = self.field(index).ok_or_else(|| {
            BoxError::Decode(format!(
                "field index {} out of range (cardinality {})",
                index,
                self.fields.len()
            ))
        })?;
        T::from_field(raw)
    }
}

/// A record type that knows how to read itself from a tuple
pub trait FromTuple: Sized {
    fn from_tuple(tuple: &Tuple) -> Result<Self>;
}

/// Decoded reply to a data request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TupleResponse {
    /// Tuple count reported by the server
    ///
    /// Equals `tuples.len()` unless the reply was count-only (no
    /// RETURN_TUPLE) or was accepted short in lenient mode.
    pub count: u32,
    pub tuples: Vec<Tuple>,
}

impl TupleResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Decode every tuple into a record type
    pub fn decode<T: FromTuple>(&self) -> Result<Vec<T>> {
        self.tuples.iter().map(T::from_tuple).collect()
    }
}

impl IntoIterator for TupleResponse {
    type Item = Tuple;
    type IntoIter = std::vec::IntoIter<Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.into_iter()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the reply body for a request of type `request_type` sent with `flags`
///
/// Only writes sent without RETURN_TUPLE may answer with a bare tuple count;
/// for every other request a missing tuple stream counts as truncation.
pub fn parse_response(
    request_type: RequestType,
    flags: Flags,
    reply: Bytes,
    mode: ResponseMode,
) -> Result<TupleResponse> {
    // Ping replies carry no body
    if request_type == RequestType::Ping {
        return Ok(TupleResponse::empty());
    }

    let mut buf = reply;

    let status = read_i32(&mut buf, "status")?;
    if status != 0 {
        let message = String::from_utf8_lossy(&buf).into_owned();
        return Err(BoxError::Server {
            code: status,
            message,
        });
    }

    let declared = read_u32(&mut buf, "tuple count")?;

    // Without RETURN_TUPLE a write is answered with the affected count only
    if !buf.has_remaining() && !returns_tuples(request_type, flags) {
        return Ok(TupleResponse {
            count: declared,
            tuples: Vec::new(),
        });
    }

    let mut tuples = Vec::with_capacity(declared.min(1024) as usize);

    while (tuples.len() as u32) < declared && buf.has_remaining() {
        tuples.push(read_tuple(&mut buf)?);
    }

    let decoded = tuples.len() as u32;
    if decoded < declared {
        match mode {
            ResponseMode::Strict => {
                return Err(BoxError::TruncatedResponse { declared, decoded });
            }
            ResponseMode::Lenient => {
                tracing::warn!(
                    "Reply declared {} tuples but only {} were present",
                    declared,
                    decoded
                );
            }
        }
    }

    if buf.has_remaining() {
        tracing::trace!("Ignoring {} trailing reply bytes", buf.remaining());
    }

    Ok(TupleResponse {
        count: declared,
        tuples,
    })
}

fn returns_tuples(request_type: RequestType, flags: Flags) -> bool {
    match request_type {
        RequestType::Select | RequestType::Call => true,
        RequestType::Insert | RequestType::Update | RequestType::Delete => {
            flags.contains(Flags::RETURN_TUPLE)
        }
        RequestType::Ping => false,
    }
}

fn read_tuple(buf: &mut Bytes) -> Result<Tuple> {
    // Informational only: decoding is driven by cardinality
    let _size = read_u32(buf, "tuple size")?;
    let cardinality = read_u32(buf, "tuple cardinality")?;

    let mut fields = Vec::with_capacity(cardinality.min(1024) as usize);
    for index in 0..cardinality {
        let len = decode_varint(buf).ok_or_else(|| {
            BoxError::MalformedResponse(format!("field {}: bad length prefix", index))
        })?;
        if len > buf.remaining() as u64 {
            return Err(BoxError::MalformedResponse(format!(
                "field {}: expected {} bytes, got {}",
                index,
                len,
                buf.remaining()
            )));
        }
        fields.push(buf.split_to(len as usize));
    }

    Ok(Tuple { fields })
}

fn read_i32(buf: &mut Bytes, what: &str) -> Result<i32> {
    ensure_remaining(buf, 4, what)?;
    Ok(buf.get_i32_le())
}

fn read_u32(buf: &mut Bytes, what: &str) -> Result<u32> {
    ensure_remaining(buf, 4, what)?;
    Ok(buf.get_u32_le())
}

fn ensure_remaining(buf: &Bytes, needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(BoxError::MalformedResponse(format!(
            "incomplete {}: expected {} bytes, got {}",
            what,
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}
