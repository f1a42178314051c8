//! Binary form of the primitive protobuf types.
//!
//! Every primitive reads and writes exactly one [`Payload`]. Truncation of a
//! raw varint to the declared width, two's-complement reinterpretation and
//! zigzag all happen here, never in the wire layer.

use std::fmt;

use bytes::Bytes;

use crate::error::{DecodeError, EncodeError};
use crate::value::Value;
use crate::wire::{Payload, WireType};

/// The primitive (non-message, non-enum) protobuf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarType {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Bool,
    Fixed32,
    Sfixed32,
    Float,
    Fixed64,
    Sfixed64,
    Double,
    String,
    Bytes,
}

impl ScalarType {
    pub const ALL: [ScalarType; 15] = [
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::Uint32,
        ScalarType::Uint64,
        ScalarType::Sint32,
        ScalarType::Sint64,
        ScalarType::Bool,
        ScalarType::Fixed32,
        ScalarType::Sfixed32,
        ScalarType::Float,
        ScalarType::Fixed64,
        ScalarType::Sfixed64,
        ScalarType::Double,
        ScalarType::String,
        ScalarType::Bytes,
    ];

    /// Returns the protobuf type name (e.g., "int32", "sfixed64").
    pub const fn proto_name(self) -> &'static str {
        match self {
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Bool => "bool",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Float => "float",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// Look up a primitive by its protobuf type name.
    pub fn from_proto_name(name: &str) -> Option<Self> {
        ScalarType::ALL
            .into_iter()
            .find(|ty| ty.proto_name() == name)
    }

    pub const fn wire_type(self) -> WireType {
        match self {
            ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::Uint32
            | ScalarType::Uint64
            | ScalarType::Sint32
            | ScalarType::Sint64
            | ScalarType::Bool => WireType::Varint,
            ScalarType::Fixed32 | ScalarType::Sfixed32 | ScalarType::Float => WireType::I32,
            ScalarType::Fixed64 | ScalarType::Sfixed64 | ScalarType::Double => WireType::I64,
            ScalarType::String | ScalarType::Bytes => WireType::Len,
        }
    }

    /// Whether a repeated field of this type may use the packed encoding.
    pub const fn is_packable(self) -> bool {
        !matches!(self.wire_type(), WireType::Len)
    }

    /// Whether this type may key a map field.
    pub const fn is_map_key(self) -> bool {
        !matches!(
            self,
            ScalarType::Float | ScalarType::Double | ScalarType::Bytes
        )
    }

    /// Name of the [`Value`] variant this type decodes to.
    pub const fn native_kind(self) -> &'static str {
        match self {
            ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => "i32",
            ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => "i64",
            ScalarType::Uint32 | ScalarType::Fixed32 => "u32",
            ScalarType::Uint64 | ScalarType::Fixed64 => "u64",
            ScalarType::Bool => "bool",
            ScalarType::Float => "f32",
            ScalarType::Double => "f64",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// The zero value of this type.
    pub fn default_value(self) -> Value {
        match self {
            ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => Value::I32(0),
            ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => Value::I64(0),
            ScalarType::Uint32 | ScalarType::Fixed32 => Value::U32(0),
            ScalarType::Uint64 | ScalarType::Fixed64 => Value::U64(0),
            ScalarType::Bool => Value::Bool(false),
            ScalarType::Float => Value::F32(0.0),
            ScalarType::Double => Value::F64(0.0),
            ScalarType::String => Value::String(String::new()),
            ScalarType::Bytes => Value::Bytes(Bytes::new()),
        }
    }

    /// Convert one payload into a native value.
    pub fn decode(self, payload: &Payload) -> Result<Value, DecodeError> {
        let value = match (self, payload) {
            (ScalarType::Int32, Payload::Varint(raw)) => Value::I32(*raw as i32),
            (ScalarType::Int64, Payload::Varint(raw)) => Value::I64(*raw as i64),
            (ScalarType::Uint32, Payload::Varint(raw)) => Value::U32(*raw as u32),
            (ScalarType::Uint64, Payload::Varint(raw)) => Value::U64(*raw),
            (ScalarType::Sint32, Payload::Varint(raw)) => {
                Value::I32(zigzag_decode_64(*raw) as i32)
            }
            (ScalarType::Sint64, Payload::Varint(raw)) => Value::I64(zigzag_decode_64(*raw)),
            (ScalarType::Bool, Payload::Varint(raw)) => Value::Bool(*raw == 1),
            (ScalarType::Fixed32, Payload::I32(raw)) => Value::U32(u32::from_le_bytes(*raw)),
            (ScalarType::Sfixed32, Payload::I32(raw)) => Value::I32(i32::from_le_bytes(*raw)),
            (ScalarType::Float, Payload::I32(raw)) => Value::F32(f32::from_le_bytes(*raw)),
            (ScalarType::Fixed64, Payload::I64(raw)) => Value::U64(u64::from_le_bytes(*raw)),
            (ScalarType::Sfixed64, Payload::I64(raw)) => Value::I64(i64::from_le_bytes(*raw)),
            (ScalarType::Double, Payload::I64(raw)) => Value::F64(f64::from_le_bytes(*raw)),
            (ScalarType::String, Payload::Len(raw)) => {
                let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
                Value::String(text.to_string())
            }
            (ScalarType::Bytes, Payload::Len(raw)) => Value::Bytes(raw.clone()),
            (ty, payload) => {
                return Err(DecodeError::WireTypeMismatch {
                    expected: ty.wire_type(),
                    actual: payload.wire_type(),
                })
            }
        };
        Ok(value)
    }

    /// Convert a native value into one payload.
    pub fn encode(self, value: &Value) -> Result<Payload, EncodeError> {
        let payload = match (self, value) {
            // Negative values are sign-extended to ten bytes.
            (ScalarType::Int32, Value::I32(v)) => Payload::Varint(i64::from(*v) as u64),
            (ScalarType::Int64, Value::I64(v)) => Payload::Varint(*v as u64),
            (ScalarType::Uint32, Value::U32(v)) => Payload::Varint(u64::from(*v)),
            (ScalarType::Uint64, Value::U64(v)) => Payload::Varint(*v),
            (ScalarType::Sint32, Value::I32(v)) => {
                Payload::Varint(u64::from(zigzag_encode_32(*v)))
            }
            (ScalarType::Sint64, Value::I64(v)) => Payload::Varint(zigzag_encode_64(*v)),
            (ScalarType::Bool, Value::Bool(v)) => Payload::Varint(u64::from(*v)),
            (ScalarType::Fixed32, Value::U32(v)) => Payload::I32(v.to_le_bytes()),
            (ScalarType::Sfixed32, Value::I32(v)) => Payload::I32(v.to_le_bytes()),
            (ScalarType::Float, Value::F32(v)) => Payload::I32(v.to_le_bytes()),
            (ScalarType::Fixed64, Value::U64(v)) => Payload::I64(v.to_le_bytes()),
            (ScalarType::Sfixed64, Value::I64(v)) => Payload::I64(v.to_le_bytes()),
            (ScalarType::Double, Value::F64(v)) => Payload::I64(v.to_le_bytes()),
            (ScalarType::String, Value::String(v)) => {
                Payload::Len(Bytes::copy_from_slice(v.as_bytes()))
            }
            (ScalarType::Bytes, Value::Bytes(v)) => Payload::Len(v.clone()),
            (ty, other) => return Err(EncodeError::mismatch(ty.native_kind(), other.kind())),
        };
        Ok(payload)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.proto_name())
    }
}

/// Zigzag encode a 32-bit signed integer.
///
/// Maps signed integers to unsigned so that small magnitudes have small encodings:
/// 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
#[inline]
pub const fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Zigzag decode to a 32-bit signed integer.
#[inline]
pub const fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

/// Zigzag encode a 64-bit signed integer.
#[inline]
pub const fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Zigzag decode to a 64-bit signed integer.
#[inline]
pub const fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}
