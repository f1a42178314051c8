//! Field codecs: how one field's native value maps to wire entries and JSON.
//!
//! A field is either single-entry ([`ScalarCodec`]: a primitive, an enum, or
//! a nested message) or spans a set of entries sharing its id
//! ([`CompositeCodec`]: repeated, packed, map). The split is made once, when
//! a schema is built, and everything downstream dispatches on the variant.

mod enumeration;
mod json;
mod map;
mod message;
mod oneof;
mod packed;
mod repeated;
mod scalar;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{DecodeError, EncodeError, JsonError, SchemaError};
use crate::schema::{DefaultValue, EnumSchema, Registry};
use crate::value::Value;
use crate::wire::{Payload, WireEntry, WireType};

pub(crate) use message::decode_message_nested;
pub use message::{
    decode_message, decode_message_json, encode_message, encode_message_json,
    encode_message_to_vec, RECURSION_LIMIT,
};
pub use scalar::{
    zigzag_decode_32, zigzag_decode_64, zigzag_encode_32, zigzag_encode_64, ScalarType,
};

type Json = serde_json::Value;

/// Codec for a field occupying exactly one wire entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarCodec {
    Primitive(ScalarType),
    /// Enum bound to its member table.
    Enum(Arc<EnumSchema>),
    /// Nested message, looked up by name in the [`Registry`].
    Message(String),
}

impl ScalarCodec {
    pub fn wire_type(&self) -> WireType {
        match self {
            ScalarCodec::Primitive(ty) => ty.wire_type(),
            ScalarCodec::Enum(_) => WireType::Varint,
            ScalarCodec::Message(_) => WireType::Len,
        }
    }

    /// Whether a repeated field of this codec may use the packed encoding.
    pub fn is_packable(&self) -> bool {
        match self {
            ScalarCodec::Primitive(ty) => ty.is_packable(),
            ScalarCodec::Enum(_) => true,
            ScalarCodec::Message(_) => false,
        }
    }

    pub fn default_value(&self) -> DefaultValue {
        match self {
            ScalarCodec::Primitive(ty) => DefaultValue::Scalar(*ty),
            ScalarCodec::Enum(schema) => DefaultValue::Enum {
                name: schema.zero_member().to_string(),
            },
            ScalarCodec::Message(name) => DefaultValue::Message(name.clone()),
        }
    }

    pub fn decode(&self, registry: &Registry, payload: &Payload) -> Result<Value, DecodeError> {
        self.decode_nested(registry, payload, 0)
    }

    /// Decode a payload found inside a message nested `depth` levels deep.
    pub(crate) fn decode_nested(
        &self,
        registry: &Registry,
        payload: &Payload,
        depth: u32,
    ) -> Result<Value, DecodeError> {
        match self {
            ScalarCodec::Primitive(ty) => ty.decode(payload),
            ScalarCodec::Enum(schema) => schema.decode(payload),
            ScalarCodec::Message(name) => match payload {
                Payload::Len(raw) => registry
                    .decode_nested(name, raw.clone(), depth + 1)
                    .map(Value::Message),
                other => Err(DecodeError::WireTypeMismatch {
                    expected: WireType::Len,
                    actual: other.wire_type(),
                }),
            },
        }
    }

    pub fn encode(&self, registry: &Registry, value: &Value) -> Result<Payload, EncodeError> {
        match self {
            ScalarCodec::Primitive(ty) => ty.encode(value),
            ScalarCodec::Enum(schema) => schema.encode(value),
            ScalarCodec::Message(name) => match value {
                Value::Message(message) => {
                    let raw = registry.encode(name, message)?;
                    Ok(Payload::Len(Bytes::from(raw)))
                }
                other => Err(EncodeError::mismatch("message", other.kind())),
            },
        }
    }

    pub fn from_json(&self, registry: &Registry, json: &Json) -> Result<Value, JsonError> {
        match self {
            ScalarCodec::Primitive(ty) => ty.from_json(json),
            ScalarCodec::Enum(schema) => schema.from_json(json),
            ScalarCodec::Message(name) => registry.decode_json(name, json).map(Value::Message),
        }
    }

    pub fn to_json(&self, registry: &Registry, value: &Value) -> Result<Json, EncodeError> {
        match self {
            ScalarCodec::Primitive(ty) => ty.to_json(value),
            ScalarCodec::Enum(schema) => schema.to_json(value),
            ScalarCodec::Message(name) => match value {
                Value::Message(message) => registry.encode_json(name, message),
                other => Err(EncodeError::mismatch("message", other.kind())),
            },
        }
    }
}

impl From<ScalarType> for ScalarCodec {
    fn from(ty: ScalarType) -> Self {
        ScalarCodec::Primitive(ty)
    }
}

impl fmt::Display for ScalarCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarCodec::Primitive(ty) => write!(f, "{ty}"),
            ScalarCodec::Enum(schema) => write!(f, "enum {}", schema.name()),
            ScalarCodec::Message(name) => write!(f, "message {name}"),
        }
    }
}

/// Codec for a field whose value spans every entry sharing its id.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeCodec {
    /// One entry per element.
    Repeated(ScalarCodec),
    /// All elements concatenated into one length-delimited entry.
    Packed(ScalarCodec),
    /// One embedded `{1: key, 2: value}` entry per pair.
    Map { key: ScalarType, value: ScalarCodec },
}

impl CompositeCodec {
    pub fn repeated(of: impl Into<ScalarCodec>) -> Self {
        CompositeCodec::Repeated(of.into())
    }

    /// Packed sequence of `of`. Messages cannot be packed.
    pub fn packed(of: impl Into<ScalarCodec>) -> Result<Self, SchemaError> {
        match of.into() {
            ScalarCodec::Message(_) => Err(SchemaError::PackedMessage),
            of => Ok(CompositeCodec::Packed(of)),
        }
    }

    /// Map keyed by `key`, which must be an integral, bool or string type.
    pub fn map(key: ScalarType, value: impl Into<ScalarCodec>) -> Result<Self, SchemaError> {
        if !key.is_map_key() {
            return Err(SchemaError::InvalidMapKey {
                found: key.proto_name(),
            });
        }
        Ok(CompositeCodec::Map {
            key,
            value: value.into(),
        })
    }

    pub fn default_value(&self) -> DefaultValue {
        match self {
            CompositeCodec::Repeated(_) | CompositeCodec::Packed(_) => DefaultValue::EmptyList,
            CompositeCodec::Map { .. } => DefaultValue::EmptyMap,
        }
    }

    /// Decode the native value from every entry that shares the field's id.
    pub fn decode_entries<'a, I>(&self, registry: &Registry, entries: I) -> Result<Value, DecodeError>
    where
        I: IntoIterator<Item = &'a WireEntry>,
    {
        self.decode_entries_nested(registry, entries, 0)
    }

    pub(crate) fn decode_entries_nested<'a, I>(
        &self,
        registry: &Registry,
        entries: I,
        depth: u32,
    ) -> Result<Value, DecodeError>
    where
        I: IntoIterator<Item = &'a WireEntry>,
    {
        match self {
            CompositeCodec::Repeated(of) => {
                repeated::decode_repeated(of, registry, entries, depth).map(Value::List)
            }
            CompositeCodec::Packed(of) => {
                packed::decode_packed(of, registry, entries, depth).map(Value::List)
            }
            CompositeCodec::Map { key, value } => {
                map::decode_map(*key, value, registry, entries, depth).map(Value::Map)
            }
        }
    }

    /// Append the entries for `value` under `tag` to `out`.
    pub fn encode_entries(
        &self,
        registry: &Registry,
        tag: u32,
        value: &Value,
        out: &mut Vec<WireEntry>,
    ) -> Result<(), EncodeError> {
        match (self, value) {
            (CompositeCodec::Repeated(of), Value::List(items)) => {
                repeated::encode_repeated(of, registry, tag, items, out)
            }
            (CompositeCodec::Packed(of), Value::List(items)) => {
                out.extend(packed::encode_packed(of, registry, tag, items)?);
                Ok(())
            }
            (CompositeCodec::Map { key, value: codec }, Value::Map(map)) => {
                map::encode_map(*key, codec, registry, tag, map, out)
            }
            (CompositeCodec::Map { .. }, other) => Err(EncodeError::mismatch("map", other.kind())),
            (_, other) => Err(EncodeError::mismatch("list", other.kind())),
        }
    }

    pub fn from_json(&self, registry: &Registry, json: &Json) -> Result<Value, JsonError> {
        match self {
            CompositeCodec::Repeated(of) | CompositeCodec::Packed(of) => {
                repeated::repeated_from_json(of, registry, json).map(Value::List)
            }
            CompositeCodec::Map { key, value } => {
                map::map_from_json(*key, value, registry, json).map(Value::Map)
            }
        }
    }

    pub fn to_json(&self, registry: &Registry, value: &Value) -> Result<Json, EncodeError> {
        match (self, value) {
            (CompositeCodec::Repeated(of) | CompositeCodec::Packed(of), Value::List(items)) => {
                repeated::repeated_to_json(of, registry, items)
            }
            (CompositeCodec::Map { value: codec, .. }, Value::Map(map)) => {
                map::map_to_json(codec, registry, map)
            }
            (CompositeCodec::Map { .. }, other) => Err(EncodeError::mismatch("map", other.kind())),
            (_, other) => Err(EncodeError::mismatch("list", other.kind())),
        }
    }
}

impl fmt::Display for CompositeCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeCodec::Repeated(of) => write!(f, "repeated {of}"),
            CompositeCodec::Packed(of) => write!(f, "packed {of}"),
            CompositeCodec::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

/// The codec selected for one field of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCodec {
    Scalar(ScalarCodec),
    Composite(CompositeCodec),
}

impl FieldCodec {
    pub fn default_value(&self) -> DefaultValue {
        match self {
            FieldCodec::Scalar(codec) => codec.default_value(),
            FieldCodec::Composite(codec) => codec.default_value(),
        }
    }

    /// Single-entry decode. Composite codecs only decode from an entry set,
    /// see [`CompositeCodec::decode_entries`].
    pub fn decode(&self, registry: &Registry, payload: &Payload) -> Result<Value, DecodeError> {
        self.decode_nested(registry, payload, 0)
    }

    pub(crate) fn decode_nested(
        &self,
        registry: &Registry,
        payload: &Payload,
        depth: u32,
    ) -> Result<Value, DecodeError> {
        match self {
            FieldCodec::Scalar(codec) => codec.decode_nested(registry, payload, depth),
            FieldCodec::Composite(_) => Err(DecodeError::ProgrammingError {
                reason: "composite fields must be decoded from their entry set",
            }),
        }
    }

    /// Single-entry encode. Composite codecs only encode to an entry set, see
    /// [`CompositeCodec::encode_entries`].
    pub fn encode(&self, registry: &Registry, value: &Value) -> Result<Payload, EncodeError> {
        match self {
            FieldCodec::Scalar(codec) => codec.encode(registry, value),
            FieldCodec::Composite(_) => Err(EncodeError::ProgrammingError {
                reason: "composite fields must be encoded to an entry set",
            }),
        }
    }

    pub fn from_json(&self, registry: &Registry, json: &Json) -> Result<Value, JsonError> {
        match self {
            FieldCodec::Scalar(codec) => codec.from_json(registry, json),
            FieldCodec::Composite(codec) => codec.from_json(registry, json),
        }
    }

    pub fn to_json(&self, registry: &Registry, value: &Value) -> Result<Json, EncodeError> {
        match self {
            FieldCodec::Scalar(codec) => codec.to_json(registry, value),
            FieldCodec::Composite(codec) => codec.to_json(registry, value),
        }
    }
}

impl From<ScalarType> for FieldCodec {
    fn from(ty: ScalarType) -> Self {
        FieldCodec::Scalar(ScalarCodec::Primitive(ty))
    }
}

impl From<ScalarCodec> for FieldCodec {
    fn from(codec: ScalarCodec) -> Self {
        FieldCodec::Scalar(codec)
    }
}

impl From<CompositeCodec> for FieldCodec {
    fn from(codec: CompositeCodec) -> Self {
        FieldCodec::Composite(codec)
    }
}

impl fmt::Display for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCodec::Scalar(codec) => codec.fmt(f),
            FieldCodec::Composite(codec) => codec.fmt(f),
        }
    }
}
