//! Field Codec Tests
//!
//! These tests verify:
//! - Byte layout of every built-in field type
//! - Payload round trips through `FromField`
//! - Custom field types plugging into the same contract

use std::io::{self, Write};

use boxproto::protocol::{decode_varint, write_field, Field, FromField};
use boxproto::BoxError;
use bytes::Bytes;

/// Encode a field and split it into (declared length, payload)
fn encode(field: &dyn Field) -> (u64, Vec<u8>) {
    let mut buf = Vec::new();
    field.encode(&mut buf).unwrap();

    let mut slice = &buf[..];
    let len = decode_varint(&mut slice).unwrap();
    (len, slice.to_vec())
}

// =============================================================================
// Built-in Layout Tests
// =============================================================================

#[test]
fn test_int32_layout() {
    let mut buf = Vec::new();
    0x0102_0304i32.encode(&mut buf).unwrap();
    assert_eq!(buf, vec![0x04, 0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_int8_layout() {
    let mut buf = Vec::new();
    18i8.encode(&mut buf).unwrap();
    assert_eq!(buf, vec![0x01, 18]);
}

#[test]
fn test_string_layout() {
    let mut buf = Vec::new();
    "Peter".encode(&mut buf).unwrap();
    assert_eq!(buf, b"\x05Peter".to_vec());
}

#[test]
fn test_empty_string_is_single_zero_byte() {
    let mut buf = Vec::new();
    "".encode(&mut buf).unwrap();
    assert_eq!(buf, vec![0x00]);
}

#[test]
fn test_long_string_uses_multibyte_prefix() {
    let value = "x".repeat(200);
    let mut buf = Vec::new();
    value.encode(&mut buf).unwrap();

    // varint(200) = 0xC8 0x01
    assert_eq!(&buf[..2], &[0xC8, 0x01]);
    assert_eq!(buf.len(), 2 + 200);
    assert!(buf[2..].iter().all(|&b| b == b'x'));
}

#[test]
fn test_byte_string_variants_agree() {
    let raw: &[u8] = &[0x00, 0xFF, 0x80];
    let expected = encode(&raw);

    assert_eq!(encode(&raw.to_vec()), expected);
    assert_eq!(encode(&Bytes::copy_from_slice(raw)), expected);
    assert_eq!(expected, (3, raw.to_vec()));
}

#[test]
fn test_boxed_field() {
    let boxed: Box<dyn Field> = Box::new(7i32);
    assert_eq!(encode(&boxed), encode(&7i32));
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_int32_round_trip() {
    for value in [0, 1, -1, 42, i32::MIN, i32::MAX] {
        let (len, payload) = encode(&value);
        assert_eq!(len, 4);
        assert_eq!(i32::from_field(&payload).unwrap(), value);
    }
}

#[test]
fn test_int8_round_trip() {
    for value in [0i8, 18, -1, i8::MIN, i8::MAX] {
        let (len, payload) = encode(&value);
        assert_eq!(len, 1);
        assert_eq!(i8::from_field(&payload).unwrap(), value);
    }
}

#[test]
fn test_int64_round_trip() {
    for value in [0i64, -5, i64::MIN, i64::MAX] {
        let (len, payload) = encode(&value);
        assert_eq!(len, 8);
        assert_eq!(i64::from_field(&payload).unwrap(), value);
    }
}

#[test]
fn test_string_round_trip() {
    for value in ["", "janitor", "Duplicate key exists", "ünïcödé"] {
        let (len, payload) = encode(&value);
        assert_eq!(len as usize, value.len());
        assert_eq!(String::from_field(&payload).unwrap(), value);
    }
}

// =============================================================================
// Decode Error Tests
// =============================================================================

#[test]
fn test_int32_rejects_wrong_width() {
    for raw in [&[][..], &[1][..], &[1, 2, 3][..], &[1, 2, 3, 4, 5][..]] {
        match i32::from_field(raw) {
            Err(BoxError::Decode(msg)) => assert!(msg.contains("expected 4 bytes")),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }
}

#[test]
fn test_int8_rejects_wrong_width() {
    assert!(matches!(i8::from_field(&[1, 2]), Err(BoxError::Decode(_))));
}

#[test]
fn test_string_decodes_any_slice() {
    assert_eq!(String::from_field(&[]).unwrap(), "");
    // Invalid UTF-8 is replaced, not rejected
    assert_eq!(String::from_field(&[b'a', 0xFF]).unwrap(), "a\u{FFFD}");
    assert_eq!(Vec::<u8>::from_field(&[0xFF, 0x00]).unwrap(), vec![0xFF, 0x00]);
}

// =============================================================================
// Custom Field Tests
// =============================================================================

/// Packs a list of years into one field of consecutive little-endian i32s
struct BestYears(Vec<i32>);

impl Field for BestYears {
    fn encode(&self, sink: &mut dyn Write) -> io::Result<()> {
        let payload: Vec<u8> = self.0.iter().flat_map(|y| y.to_le_bytes()).collect();
        write_field(sink, &payload)
    }
}

#[test]
fn test_custom_field() {
    let (len, payload) = encode(&BestYears(vec![1998, 2004]));
    assert_eq!(len, 8);
    assert_eq!(i32::from_field(&payload[..4]).unwrap(), 1998);
    assert_eq!(i32::from_field(&payload[4..]).unwrap(), 2004);
}

/// A sink that accepts a fixed number of bytes, then fails
struct LimitedSink {
    remaining: usize,
}

impl Write for LimitedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
        }
        let n = buf.len().min(self.remaining);
        self.remaining -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_sink_failure_surfaces() {
    let mut sink = LimitedSink { remaining: 2 };
    let err = "janitor".encode(&mut sink).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WriteZero);
}
