//! Protocol Module
//!
//! Wire format for the box binary protocol.
//!
//! ## Request Flow
//! ```text
//! fields ──► encode_request ──► Envelope { type, flags, body } ──► Transport
//!                                                                    │
//! TupleResponse ◄── parse_response(type, flags) ◄── reply body ◄─────┘
//! ```
//!
//! ### Request Types
//! - 13: INSERT (also ADD / REPLACE via flags)
//! - 17: SELECT
//! - 19: UPDATE
//! - 21: DELETE
//! - 22: CALL
//! - 65280: PING
//!
//! ### Flags
//! - 0x01: RETURN_TUPLE
//! - 0x02: ADD
//! - 0x04: REPLACE
//!
//! All multi-byte integers are little-endian.

mod field;
mod request;
mod response;
mod codec;

pub use field::{write_field, Field, FromField};
pub use request::{Flags, InsertMode, Key, Request, RequestType, UpdateOp, UpdateOpCode};
pub use response::{parse_response, FromTuple, ResponseMode, Tuple, TupleResponse};
pub use codec::{decode_varint, encode_request, encode_varint, Envelope};
