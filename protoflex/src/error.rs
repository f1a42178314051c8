//! Errors surfaced by the wire codec, the JSON mapping and schema construction.

use thiserror::Error;

/// Reason a field key failed to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidKeyReason {
    /// The buffer ended before a key could be read.
    EmptyBuffer,
    /// The field number was zero or larger than `2^29 - 1`.
    TagOutOfRange,
}

impl InvalidKeyReason {
    fn as_str(&self) -> &'static str {
        match self {
            InvalidKeyReason::EmptyBuffer => "empty buffer",
            InvalidKeyReason::TagOutOfRange => "tag out of range",
        }
    }
}

impl std::fmt::Display for InvalidKeyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed binary input, or a decode-side misuse of a codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    #[error("invalid key: '{reason}'")]
    InvalidKey { reason: InvalidKeyReason },
    #[error("wire type mismatch: expected {expected:?}, found {actual:?}")]
    WireTypeMismatch {
        expected: crate::wire::WireType,
        actual: crate::wire::WireType,
    },
    #[error("invalid leb128 varint")]
    InvalidVarInt,
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("length prefix {value} exceeds platform addressable memory")]
    LengthOverflow { value: u64 },
    #[error("unknown message type '{name}'")]
    UnknownMessage { name: String },
    #[error("messages nested deeper than {limit} levels")]
    RecursionLimit { limit: u32 },
    #[error("programming error: '{reason}'")]
    ProgrammingError { reason: &'static str },
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    #[cold]
    pub fn invalid_wire_type(value: u8) -> Self {
        DecodeError::InvalidWireType { value }
    }

    #[cold]
    pub fn invalid_key(reason: InvalidKeyReason) -> Self {
        DecodeError::InvalidKey { reason }
    }

    #[cold]
    pub fn invalid_varint() -> Self {
        DecodeError::InvalidVarInt
    }

    #[cold]
    pub fn unexpected_end_of_buffer() -> Self {
        DecodeError::UnexpectedEndOfBuffer
    }

    #[cold]
    pub fn length_overflow(value: u64) -> Self {
        DecodeError::LengthOverflow { value }
    }

    /// Attach the name of the field being decoded.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        DecodeError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}

/// A JSON value whose shape does not match the representation a field expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum JsonError {
    #[error("malformed json: expected {expected}")]
    Malformed { expected: &'static str },
    #[error("malformed json: {value} is out of range for {target_type}")]
    OutOfRange {
        value: String,
        target_type: &'static str,
    },
    #[error("malformed json: '{name}' is not a member of enum {enum_name}")]
    UnknownEnumMember { enum_name: String, name: String },
    #[error("malformed json: invalid base64")]
    InvalidBase64,
    #[error("unknown message type '{name}'")]
    UnknownMessage { name: String },
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<JsonError>,
    },
}

impl JsonError {
    #[cold]
    pub fn malformed(expected: &'static str) -> Self {
        JsonError::Malformed { expected }
    }

    #[cold]
    pub fn out_of_range(value: impl ToString, target_type: &'static str) -> Self {
        JsonError::OutOfRange {
            value: value.to_string(),
            target_type,
        }
    }

    /// Attach the name of the field being converted.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        JsonError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}

/// A native value that cannot be written with the codec selected for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown message type '{name}'")]
    UnknownMessage { name: String },
    #[error("programming error: '{reason}'")]
    ProgrammingError { reason: &'static str },
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<EncodeError>,
    },
}

impl EncodeError {
    #[cold]
    pub fn mismatch(expected: &'static str, found: &'static str) -> Self {
        EncodeError::ValueMismatch { expected, found }
    }

    /// Attach the name of the field being encoded.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        EncodeError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}

/// Invalid construction of a runtime schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("message '{message}': field id {id} is used more than once")]
    DuplicateFieldId { message: String, id: u32 },
    #[error("message '{message}': field name '{field}' is used more than once")]
    DuplicateFieldName { message: String, field: String },
    #[error("message '{message}': field id {id} is outside 1..=536870911")]
    FieldIdOutOfRange { message: String, id: u32 },
    #[error("message '{message}': oneof member '{field}' must be a single-entry field")]
    CompositeOneofMember { message: String, field: String },
    #[error("packed fields cannot hold messages")]
    PackedMessage,
    #[error("map keys must be integral, bool or string, found {found}")]
    InvalidMapKey { found: &'static str },
    #[error("enum '{name}' has no member with value 0")]
    MissingEnumZero { name: String },
    #[error("'{name}' is defined more than once")]
    DuplicateSymbol { name: String },
}
