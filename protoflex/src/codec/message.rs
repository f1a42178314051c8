//! Message driver: walks a [`MessageSchema`] to move a [`MessageValue`]
//! to and from wire entries and JSON.
//!
//! Decoding is by field id, encoding is in declaration order. Every failure is
//! wrapped with the name of the field it came from.

use bytes::{BufMut, Bytes};

use super::oneof::{self, EntriesById};
use super::FieldCodec;
use crate::error::{DecodeError, EncodeError, JsonError};
use crate::schema::{FieldSpec, MessageSchema, Registry};
use crate::value::{MessageValue, Value};
use crate::wire::{self, WireEntry};

type Json = serde_json::Value;

/// How deep messages may nest inside one decoded message.
pub const RECURSION_LIMIT: u32 = 100;

/// Decode `buf` as an instance of `schema`.
///
/// The result is partial: fields that did not appear on the wire are absent.
/// See [`Registry::decode`] for a full instance. Unknown field ids are
/// skipped; a malformed record aborts the whole message. Input nesting
/// messages more than [`RECURSION_LIMIT`] levels deep is rejected.
pub fn decode_message(
    registry: &Registry,
    schema: &MessageSchema,
    buf: impl Into<Bytes>,
) -> Result<MessageValue, DecodeError> {
    decode_message_nested(registry, schema, buf.into(), 0)
}

/// Decode a message found `depth` levels below the outermost one.
pub(crate) fn decode_message_nested(
    registry: &Registry,
    schema: &MessageSchema,
    buf: Bytes,
    depth: u32,
) -> Result<MessageValue, DecodeError> {
    if depth > RECURSION_LIMIT {
        return Err(DecodeError::RecursionLimit {
            limit: RECURSION_LIMIT,
        });
    }

    let mut by_id = EntriesById::new();
    for (position, entry) in wire::decode(buf).enumerate() {
        let entry = entry?;
        if schema.field_by_id(entry.tag).is_none() {
            continue;
        }
        by_id.entry(entry.tag).or_default().push((position, entry));
    }

    let mut message = MessageValue::new();
    for field in schema.fields().iter().filter(|f| f.oneof().is_none()) {
        let Some(entries) = by_id.get(&field.id()) else {
            continue;
        };
        let entries = entries.iter().map(|(_, entry)| entry);
        let value = match field.codec() {
            FieldCodec::Composite(codec) => {
                Some(codec.decode_entries_nested(registry, entries, depth))
            }
            FieldCodec::Scalar(codec) => entries
                .filter(|entry| entry.wire_type() == codec.wire_type())
                .last()
                .map(|entry| codec.decode_nested(registry, &entry.payload, depth)),
        };
        if let Some(value) = value {
            let value = value.map_err(|err| err.in_field(field.name()))?;
            message.set(field.name(), value);
        }
    }

    for group in schema.oneofs() {
        if let Some(member) = oneof::decode_oneof(registry, schema, group, &by_id, depth)? {
            message.insert_oneof(group.name().to_string(), member);
        }
    }

    Ok(message)
}

/// Decode a JSON object as an instance of `schema`.
///
/// Like [`decode_message`] the result is partial. Absent and `null` members
/// leave their field absent and unknown members are ignored.
pub fn decode_message_json(
    registry: &Registry,
    schema: &MessageSchema,
    json: &Json,
) -> Result<MessageValue, JsonError> {
    let Json::Object(object) = json else {
        return Err(JsonError::malformed("object"));
    };

    let mut message = MessageValue::new();
    for field in schema.fields().iter().filter(|f| f.oneof().is_none()) {
        match object.get(field.name()) {
            None | Some(Json::Null) => continue,
            Some(json) => {
                let value = field
                    .codec()
                    .from_json(registry, json)
                    .map_err(|err| err.in_field(field.name()))?;
                message.set(field.name(), value);
            }
        }
    }

    for group in schema.oneofs() {
        if let Some(member) = oneof::oneof_from_json(registry, schema, group, object)? {
            message.insert_oneof(group.name().to_string(), member);
        }
    }

    Ok(message)
}

/// The value to emit for `field`, if any.
///
/// A oneof member is only emitted when it is the populated member of its
/// group.
fn field_value<'a>(
    schema: &MessageSchema,
    field: &FieldSpec,
    message: &'a MessageValue,
) -> Option<&'a Value> {
    match field.oneof() {
        None => message.field(field.name()),
        Some(index) => {
            let group = &schema.oneofs()[index];
            message
                .oneof(group.name())
                .filter(|member| member.field == field.name())
                .map(|member| &member.value)
        }
    }
}

fn message_entries(
    registry: &Registry,
    schema: &MessageSchema,
    message: &MessageValue,
) -> Result<Vec<WireEntry>, EncodeError> {
    let mut entries = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let Some(value) = field_value(schema, field, message) else {
            continue;
        };
        let result = match field.codec() {
            FieldCodec::Scalar(codec) => codec
                .encode(registry, value)
                .map(|payload| entries.push(WireEntry::new(field.id(), payload))),
            FieldCodec::Composite(codec) => {
                codec.encode_entries(registry, field.id(), value, &mut entries)
            }
        };
        result.map_err(|err| err.in_field(field.name()))?;
    }
    Ok(entries)
}

/// Encode `message` into `buf`, fields in declaration order.
///
/// Absent fields are not written. Names the schema does not declare are
/// ignored.
pub fn encode_message<B: BufMut>(
    registry: &Registry,
    schema: &MessageSchema,
    message: &MessageValue,
    buf: &mut B,
) -> Result<(), EncodeError> {
    let entries = message_entries(registry, schema, message)?;
    wire::encode(&entries, buf);
    Ok(())
}

/// Encode `message` into a freshly allocated buffer.
pub fn encode_message_to_vec(
    registry: &Registry,
    schema: &MessageSchema,
    message: &MessageValue,
) -> Result<Vec<u8>, EncodeError> {
    let entries = message_entries(registry, schema, message)?;
    Ok(wire::encode_to_vec(&entries))
}

/// Convert `message` to a JSON object with one member per present field.
pub fn encode_message_json(
    registry: &Registry,
    schema: &MessageSchema,
    message: &MessageValue,
) -> Result<Json, EncodeError> {
    let mut object = serde_json::Map::new();
    for field in schema.fields() {
        let Some(value) = field_value(schema, field, message) else {
            continue;
        };
        let json = field
            .codec()
            .to_json(registry, value)
            .map_err(|err| err.in_field(field.name()))?;
        object.insert(field.name().to_string(), json);
    }
    Ok(Json::Object(object))
}
