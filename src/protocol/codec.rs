//! Protocol codec
//!
//! Request body assembly and varint helpers.
//!
//! ## Body Layouts
//!
//! All integers are 4 bytes little-endian unless noted; `fields` is a
//! sequence of length-prefixed fields (see `field`).
//!
//! ```text
//! SELECT:  space | index | offset | limit | key_count | { field_count | fields }*
//! INSERT:  space | flags | field_count | fields
//! UPDATE:  space | flags | key_field_count | fields | op_count
//!          | { field_no | opcode (1) | field }*
//! DELETE:  space | flags | key_field_count | fields
//! CALL:    flags | proc_name (field) | arg_count | fields
//! PING:    empty
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{BoxError, Result};
use super::field::Field;
use super::request::{Flags, Request, RequestType};

// =============================================================================
// Varint (unsigned LEB128)
// =============================================================================

/// Encode a varint
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a varint, advancing the buffer
///
/// Returns `None` if the buffer ends mid-varint or the value overflows 64 bits.
pub fn decode_varint(buf: &mut impl Buf) -> Option<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        if !buf.has_remaining() {
            return None;
        }
        let byte = buf.get_u8();

        // Tenth byte may carry only the top bit of a u64
        if shift == 63 && byte & 0x7F > 1 {
            return None;
        }
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some(result);
        }
        shift += 7;
        if shift >= 64 {
            return None;
        }
    }
}

// =============================================================================
// Request Encoding
// =============================================================================

/// A fully assembled request: the opcode, its flags and its body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub request_type: RequestType,
    pub flags: Flags,
    pub body: Bytes,
}

/// Encode a request body
///
/// Any field failure aborts assembly; no partial body is returned.
pub fn encode_request(request: &Request<'_>) -> Result<Envelope> {
    let mut body = BytesMut::new();

    match *request {
        Request::Select { space_no, index_no, offset, limit, keys } => {
            body.put_u32_le(space_no);
            body.put_u32_le(index_no);
            body.put_u32_le(offset);
            body.put_u32_le(limit);
            body.put_u32_le(keys.len() as u32);
            for key in keys {
                put_fields(&mut body, key)?;
            }
        }
        Request::Insert { space_no, flags, tuple } => {
            body.put_u32_le(space_no);
            body.put_u32_le(flags.bits());
            put_fields(&mut body, tuple)?;
        }
        Request::Update { space_no, flags, key, ops } => {
            body.put_u32_le(space_no);
            body.put_u32_le(flags.bits());
            put_fields(&mut body, key)?;
            body.put_u32_le(ops.len() as u32);
            for op in ops {
                body.put_u32_le(op.field_no);
                body.put_u8(op.op as u8);
                put_field(&mut body, op.arg)?;
            }
        }
        Request::Delete { space_no, flags, key } => {
            body.put_u32_le(space_no);
            body.put_u32_le(flags.bits());
            put_fields(&mut body, key)?;
        }
        Request::Call { flags, proc_name, args } => {
            body.put_u32_le(flags.bits());
            put_field(&mut body, &proc_name)?;
            put_fields(&mut body, args)?;
        }
        Request::Ping => {}
    }

    Ok(Envelope {
        request_type: request.request_type(),
        flags: request.flags(),
        body: body.freeze(),
    })
}

/// Write a field count followed by each field
fn put_fields(body: &mut BytesMut, fields: &[&dyn Field]) -> Result<()> {
    body.put_u32_le(fields.len() as u32);
    for field in fields {
        put_field(body, *field)?;
    }
    Ok(())
}

fn put_field(body: &mut BytesMut, field: &dyn Field) -> Result<()> {
    let mut writer = body.writer();
    field.encode(&mut writer).map_err(BoxError::Encode)
}
