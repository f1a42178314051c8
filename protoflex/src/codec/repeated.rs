//! Repeated fields: one wire entry per element.

use super::{packed, ScalarCodec};
use crate::error::{DecodeError, EncodeError, JsonError};
use crate::schema::Registry;
use crate::value::Value;
use crate::wire::{Payload, WireEntry};

type Json = serde_json::Value;

/// Decode every entry whose wire type matches the element codec, in order.
///
/// Parsers must accept a packed entry for a packable repeated field, so a
/// length-delimited entry for a varint/fixed element is unpacked in place.
/// Anything else is skipped.
pub(crate) fn decode_repeated<'a, I>(
    of: &ScalarCodec,
    registry: &Registry,
    entries: I,
    depth: u32,
) -> Result<Vec<Value>, DecodeError>
where
    I: IntoIterator<Item = &'a WireEntry>,
{
    let mut items = Vec::new();
    for entry in entries {
        if entry.wire_type() == of.wire_type() {
            items.push(of.decode_nested(registry, &entry.payload, depth)?);
        } else if let (true, Payload::Len(raw)) = (of.is_packable(), &entry.payload) {
            packed::decode_packed_into(of, registry, raw, depth, &mut items)?;
        }
    }
    Ok(items)
}

pub(crate) fn encode_repeated(
    of: &ScalarCodec,
    registry: &Registry,
    tag: u32,
    items: &[Value],
    out: &mut Vec<WireEntry>,
) -> Result<(), EncodeError> {
    out.reserve(items.len());
    for item in items {
        out.push(WireEntry::new(tag, of.encode(registry, item)?));
    }
    Ok(())
}

/// Accepts an array, or a single bare value read as a one-element array.
pub(crate) fn repeated_from_json(
    of: &ScalarCodec,
    registry: &Registry,
    json: &Json,
) -> Result<Vec<Value>, JsonError> {
    match json {
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::Null => Err(JsonError::malformed("non-null array element")),
                item => of.from_json(registry, item),
            })
            .collect(),
        Json::Null => Err(JsonError::malformed("array")),
        single => Ok(vec![of.from_json(registry, single)?]),
    }
}

pub(crate) fn repeated_to_json(
    of: &ScalarCodec,
    registry: &Registry,
    items: &[Value],
) -> Result<Json, EncodeError> {
    items
        .iter()
        .map(|item| of.to_json(registry, item))
        .collect::<Result<Vec<_>, _>>()
        .map(Json::Array)
}
