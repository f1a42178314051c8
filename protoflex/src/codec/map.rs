//! Map fields.
//!
//! Each pair is its own length-delimited entry holding an embedded message
//! with the key at field 1 and the value at field 2. Order on the wire is not
//! significant and a repeated key keeps its last value.

use std::collections::BTreeMap;

use bytes::Bytes;

use super::{ScalarCodec, ScalarType};
use crate::error::{DecodeError, EncodeError, JsonError};
use crate::schema::Registry;
use crate::value::{MapKey, Value};
use crate::wire::{self, Payload, WireEntry};

type Json = serde_json::Value;

const KEY_TAG: u32 = 1;
const VALUE_TAG: u32 = 2;

pub(crate) fn decode_map<'a, I>(
    key: ScalarType,
    value: &ScalarCodec,
    registry: &Registry,
    entries: I,
    depth: u32,
) -> Result<BTreeMap<MapKey, Value>, DecodeError>
where
    I: IntoIterator<Item = &'a WireEntry>,
{
    let mut map = BTreeMap::new();
    for entry in entries {
        let Payload::Len(raw) = &entry.payload else {
            continue;
        };
        if let Some((k, v)) = decode_pair(key, value, registry, raw, depth)? {
            map.insert(k, v);
        }
    }
    Ok(map)
}

/// A pair is only produced when the entry carried both a key and a value.
fn decode_pair(
    key: ScalarType,
    value: &ScalarCodec,
    registry: &Registry,
    raw: &Bytes,
    depth: u32,
) -> Result<Option<(MapKey, Value)>, DecodeError> {
    let mut k = None;
    let mut v = None;
    for entry in wire::decode(raw.clone()) {
        let entry = entry?;
        match entry.tag {
            KEY_TAG if entry.wire_type() == key.wire_type() => {
                k = Some(key.decode(&entry.payload)?);
            }
            VALUE_TAG if entry.wire_type() == value.wire_type() => {
                v = Some(value.decode_nested(registry, &entry.payload, depth)?);
            }
            _ => (),
        }
    }

    match (k, v) {
        (Some(k), Some(v)) => {
            let k = MapKey::from_value(k).ok_or(DecodeError::ProgrammingError {
                reason: "map key decoded to a non-key value",
            })?;
            Ok(Some((k, v)))
        }
        _ => Ok(None),
    }
}

pub(crate) fn encode_map(
    key: ScalarType,
    value: &ScalarCodec,
    registry: &Registry,
    tag: u32,
    map: &BTreeMap<MapKey, Value>,
    out: &mut Vec<WireEntry>,
) -> Result<(), EncodeError> {
    out.reserve(map.len());
    for (k, v) in map {
        let pair = [
            WireEntry::new(KEY_TAG, key.encode(&Value::from(k.clone()))?),
            WireEntry::new(VALUE_TAG, value.encode(registry, v)?),
        ];
        let raw = wire::encode_to_vec(&pair);
        out.push(WireEntry::new(tag, Payload::Len(Bytes::from(raw))));
    }
    Ok(())
}

/// JSON maps are objects; keys are always strings and parsed per key type.
pub(crate) fn map_from_json(
    key: ScalarType,
    value: &ScalarCodec,
    registry: &Registry,
    json: &Json,
) -> Result<BTreeMap<MapKey, Value>, JsonError> {
    let Json::Object(object) = json else {
        return Err(JsonError::malformed("object"));
    };

    let mut map = BTreeMap::new();
    for (k, v) in object {
        let k = key_from_json(key, k)?;
        let v = value
            .from_json(registry, v)
            .map_err(|err| err.in_field(format!("[{k}]")))?;
        map.insert(k, v);
    }
    Ok(map)
}

fn key_from_json(key: ScalarType, raw: &str) -> Result<MapKey, JsonError> {
    let parsed = match key {
        ScalarType::Bool => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(JsonError::malformed("\"true\" or \"false\" map key")),
        },
        ScalarType::String => Value::String(raw.to_string()),
        integral => integral.from_json(&Json::String(raw.to_string()))?,
    };
    MapKey::from_value(parsed).ok_or(JsonError::malformed("map key"))
}

pub(crate) fn map_to_json(
    value: &ScalarCodec,
    registry: &Registry,
    map: &BTreeMap<MapKey, Value>,
) -> Result<Json, EncodeError> {
    let mut object = serde_json::Map::with_capacity(map.len());
    for (k, v) in map {
        object.insert(k.to_string(), value.to_json(registry, v)?);
    }
    Ok(Json::Object(object))
}
