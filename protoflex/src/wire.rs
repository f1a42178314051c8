//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).
//!
//! An encoded message is a flat series of records. Each record is a varint
//! key, `(field_id << 3) | wire_type`, followed by a payload whose framing is
//! selected by the wire type. This layer knows nothing about field types: it
//! never applies zigzag or any other reinterpretation of a payload.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{DecodeError, InvalidKeyReason};
use crate::leb128::LebCodec;

/// Minimum value of a protobuf tag.
pub const MINIMUM_TAG_VAL: u32 = 1;
/// Maximum value of a protobuf tag.
pub const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;

static_assertions::const_assert!(MAXIMUM_TAG_VAL << 3 >> 3 == MAXIMUM_TAG_VAL);

/// Denotes the framing of a record in an encoded protobuf message.
///
/// The deprecated group markers (3 and 4) and the unassigned values 6 and 7
/// are not representable; decoding them fails with
/// [`DecodeError::InvalidWireType`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`, `bool`, `enum`.
    Varint = 0,
    /// 64-bit little-endian value.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Variable length field.
    ///
    /// Used for: `string`, `bytes`, `message`, packed `repeated` fields, map entries.
    Len = 2,
    /// 32-bit little-endian value.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

static_assertions::assert_eq_size!(WireType, u8);

impl WireType {
    /// Try to decode a [`WireType`] from the provided raw value.
    #[inline]
    pub fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            5 => Ok(WireType::I32),
            other => Err(DecodeError::invalid_wire_type(other)),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

/// The payload of a single record. Its variant fully determines the wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A raw varint, not yet truncated or reinterpreted.
    Varint(u64),
    /// Eight bytes, little-endian.
    I64([u8; 8]),
    /// A length-delimited byte string.
    Len(Bytes),
    /// Four bytes, little-endian.
    I32([u8; 4]),
}

impl Payload {
    /// The [`WireType`] this payload is framed with.
    pub const fn wire_type(&self) -> WireType {
        match self {
            Payload::Varint(_) => WireType::Varint,
            Payload::I64(_) => WireType::I64,
            Payload::Len(_) => WireType::Len,
            Payload::I32(_) => WireType::I32,
        }
    }

    /// Number of bytes this payload occupies on the wire, excluding the key.
    pub fn encoded_len(&self) -> usize {
        match self {
            Payload::Varint(value) => value.encoded_leb128_len(),
            Payload::I64(_) => 8,
            Payload::Len(bytes) => {
                let len = bytes.len() as u64;
                len.encoded_leb128_len() + bytes.len()
            }
            Payload::I32(_) => 4,
        }
    }

    /// Write just the payload (no key) into `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            Payload::Varint(value) => {
                value.encode_leb128(buf);
            }
            Payload::I64(raw) => buf.put_slice(raw),
            Payload::Len(bytes) => {
                (bytes.len() as u64).encode_leb128(buf);
                buf.put_slice(bytes);
            }
            Payload::I32(raw) => buf.put_slice(raw),
        }
    }

    /// Read a payload framed as `wire_type` from the front of `buf`.
    pub fn decode(wire_type: WireType, buf: &mut Bytes) -> Result<Self, DecodeError> {
        let payload = match wire_type {
            WireType::Varint => Payload::Varint(u64::decode_leb128_buf(buf)?.0),
            WireType::I64 => Payload::I64(take_array(buf)?),
            WireType::Len => {
                let len = decode_len(buf)?;
                if buf.remaining() < len {
                    return Err(DecodeError::unexpected_end_of_buffer());
                }
                Payload::Len(buf.copy_to_bytes(len))
            }
            WireType::I32 => Payload::I32(take_array(buf)?),
        };
        Ok(payload)
    }
}

fn take_array<const N: usize>(buf: &mut Bytes) -> Result<[u8; N], DecodeError> {
    if buf.remaining() < N {
        return Err(DecodeError::unexpected_end_of_buffer());
    }
    let mut raw = [0u8; N];
    buf.copy_to_slice(&mut raw);
    Ok(raw)
}

/// A single decoded record: field id plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEntry {
    pub tag: u32,
    pub payload: Payload,
}

impl WireEntry {
    pub fn new(tag: u32, payload: Payload) -> Self {
        WireEntry { tag, payload }
    }

    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.payload.wire_type()
    }

    /// Number of bytes this record occupies on the wire, including the key.
    pub fn encoded_len(&self) -> usize {
        encoded_key_len(self.tag) + self.payload.encoded_len()
    }

    /// Write the key and payload of this record into `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        encode_key(self.wire_type(), self.tag, buf);
        self.payload.encode(buf);
    }
}

/// Iterator over the records of an encoded message.
///
/// Single pass and not restartable: it walks a cursor over the buffer it was
/// created with, and decoding the same bytes again requires a fresh call to
/// [`decode`]. The first malformed record is yielded as an error, after which
/// the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Entries {
    buf: Bytes,
    failed: bool,
}

impl Iterator for Entries {
    type Item = Result<WireEntry, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.buf.has_remaining() {
            return None;
        }

        let result = decode_key(&mut self.buf).and_then(|(wire_type, tag)| {
            let payload = Payload::decode(wire_type, &mut self.buf)?;
            Ok(WireEntry { tag, payload })
        });
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for Entries {}

/// Decode `buf` into its records, left to right.
pub fn decode(buf: impl Into<Bytes>) -> Entries {
    Entries {
        buf: buf.into(),
        failed: false,
    }
}

/// Encode `entries` into `buf`, in the order given.
pub fn encode<'a, B, I>(entries: I, buf: &mut B)
where
    B: BufMut,
    I: IntoIterator<Item = &'a WireEntry>,
{
    for entry in entries {
        entry.encode(buf);
    }
}

/// Encode `entries` into a freshly allocated buffer.
pub fn encode_to_vec<'a, I>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a WireEntry>,
    I::IntoIter: Clone,
{
    let entries = entries.into_iter();
    let len = entries.clone().map(WireEntry::encoded_len).sum();
    let mut buf = Vec::with_capacity(len);
    encode(entries, &mut buf);
    buf
}

/// Encodes the provided tag and wire_type as a protobuf field key.
///
/// Follows the specification from <https://protobuf.dev/programming-guides/encoding>
/// under the "Message Structure" section.
#[inline]
pub fn encode_key<B: BufMut>(wire_type: WireType, tag: u32, buf: &mut B) {
    let key = (tag << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// Returns the encoded length of a field key (tag + wire type).
#[inline]
pub fn encoded_key_len(tag: u32) -> usize {
    // The wire type only occupies the low three bits and never changes the length.
    (tag << 3).encoded_leb128_len()
}

/// Decodes a key from the front of `buf`, returning its wire type and tag.
pub fn decode_key<B: Buf>(buf: &mut B) -> Result<(WireType, u32), DecodeError> {
    if !buf.has_remaining() {
        return Err(DecodeError::invalid_key(InvalidKeyReason::EmptyBuffer));
    }

    // Keys are read at full width so an oversized tag is reported as such
    // rather than as a malformed varint.
    let (raw, _) = u64::decode_leb128_buf(buf)?;
    let wire_type = WireType::try_from_val((raw & 0b111) as u8)?;
    let tag = raw >> 3;
    if tag < u64::from(MINIMUM_TAG_VAL) || tag > u64::from(MAXIMUM_TAG_VAL) {
        return Err(DecodeError::invalid_key(InvalidKeyReason::TagOutOfRange));
    }
    Ok((wire_type, tag as u32))
}

/// Decodes the length prefix for a length-delimited field.
#[inline]
pub fn decode_len<B: Buf>(buf: &mut B) -> Result<usize, DecodeError> {
    let (len, _) = u64::decode_leb128_buf(buf)?;
    usize::try_from(len).map_err(|_| DecodeError::length_overflow(len))
}
