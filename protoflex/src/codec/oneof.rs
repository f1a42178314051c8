//! Oneof groups: selecting the single populated member.

use std::collections::HashMap;

use super::FieldCodec;
use crate::error::{DecodeError, JsonError};
use crate::schema::{MessageSchema, OneofSpec, Registry};
use crate::value::OneofValue;
use crate::wire::WireEntry;

type Json = serde_json::Value;

/// Entries of one message grouped by field id, each with its position in the
/// byte stream.
pub(crate) type EntriesById = HashMap<u32, Vec<(usize, WireEntry)>>;

/// Pick the member of `oneof` whose matching entry appears last in the stream.
pub(crate) fn decode_oneof(
    registry: &Registry,
    schema: &MessageSchema,
    oneof: &OneofSpec,
    entries: &EntriesById,
    depth: u32,
) -> Result<Option<OneofValue>, DecodeError> {
    let mut winner: Option<(usize, usize, &WireEntry)> = None;
    for &index in oneof.fields() {
        let field = &schema.fields()[index];
        let FieldCodec::Scalar(codec) = field.codec() else {
            continue;
        };
        let last = entries.get(&field.id()).and_then(|entries| {
            entries
                .iter()
                .rev()
                .find(|(_, entry)| entry.wire_type() == codec.wire_type())
        });
        if let Some((position, entry)) = last {
            if winner.map_or(true, |(best, _, _)| *position > best) {
                winner = Some((*position, index, entry));
            }
        }
    }

    let Some((_, index, entry)) = winner else {
        return Ok(None);
    };
    let field = &schema.fields()[index];
    let value = field
        .codec()
        .decode_nested(registry, &entry.payload, depth)
        .map_err(|err| err.in_field(field.name()))?;
    Ok(Some(OneofValue::new(field.name(), value)))
}

/// The first member, in declaration order, with a non-null value in `object`.
pub(crate) fn oneof_from_json(
    registry: &Registry,
    schema: &MessageSchema,
    oneof: &OneofSpec,
    object: &serde_json::Map<String, Json>,
) -> Result<Option<OneofValue>, JsonError> {
    for &index in oneof.fields() {
        let field = &schema.fields()[index];
        match object.get(field.name()) {
            None | Some(Json::Null) => continue,
            Some(json) => {
                let value = field
                    .codec()
                    .from_json(registry, json)
                    .map_err(|err| err.in_field(field.name()))?;
                return Ok(Some(OneofValue::new(field.name(), value)));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::codec::ScalarType;
    use crate::value::Value;
    use crate::wire::Payload;

    fn schema() -> MessageSchema {
        MessageSchema::builder("Choice")
            .field("id", 1, ScalarType::Int32)
            .oneof(
                "kind",
                [("name", 2, ScalarType::String), ("number", 3, ScalarType::Int64)],
            )
            .build()
            .unwrap()
    }

    fn group(entries: &[WireEntry]) -> EntriesById {
        let mut by_id = EntriesById::new();
        for (position, entry) in entries.iter().enumerate() {
            by_id
                .entry(entry.tag)
                .or_default()
                .push((position, entry.clone()));
        }
        by_id
    }

    #[test]
    fn test_last_member_in_stream_wins() {
        let registry = Registry::new();
        let schema = schema();
        let oneof = &schema.oneofs()[0];

        let entries = group(&[
            WireEntry::new(3, Payload::Varint(9)),
            WireEntry::new(2, Payload::Len(Bytes::from_static(b"x"))),
        ]);
        let member = decode_oneof(&registry, &schema, oneof, &entries, 0).unwrap();
        assert_eq!(member, Some(OneofValue::new("name", "x")));

        let entries = group(&[
            WireEntry::new(2, Payload::Len(Bytes::from_static(b"x"))),
            WireEntry::new(3, Payload::Varint(9)),
        ]);
        let member = decode_oneof(&registry, &schema, oneof, &entries, 0).unwrap();
        assert_eq!(member, Some(OneofValue::new("number", Value::I64(9))));
    }

    #[test]
    fn test_mismatched_wire_type_ignored() {
        let registry = Registry::new();
        let schema = schema();
        let entries = group(&[WireEntry::new(3, Payload::I32([0; 4]))]);
        let member = decode_oneof(&registry, &schema, &schema.oneofs()[0], &entries, 0).unwrap();
        assert_eq!(member, None);
    }

    #[test]
    fn test_json_first_declared_member_wins() {
        let registry = Registry::new();
        let schema = schema();
        let oneof = &schema.oneofs()[0];

        let object = json!({"number": "4", "name": "n"});
        let member = oneof_from_json(&registry, &schema, oneof, object.as_object().unwrap());
        assert_eq!(member.unwrap(), Some(OneofValue::new("name", "n")));

        let object = json!({"name": null, "number": 4});
        let member = oneof_from_json(&registry, &schema, oneof, object.as_object().unwrap());
        assert_eq!(member.unwrap(), Some(OneofValue::new("number", Value::I64(4))));

        let object = json!({"number": true});
        let err = oneof_from_json(&registry, &schema, oneof, object.as_object().unwrap());
        assert!(matches!(err, Err(JsonError::Field { .. })));
    }
}
