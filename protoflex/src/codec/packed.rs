//! Packed repeated fields.
//!
//! All elements are written back to back, without keys, inside a single
//! length-delimited entry. Length-delimited elements keep their own length
//! prefix inside the run.

use bytes::{Buf, Bytes};

use super::ScalarCodec;
use crate::error::{DecodeError, EncodeError};
use crate::schema::Registry;
use crate::value::Value;
use crate::wire::{Payload, WireEntry};

/// Decode a packed field from all of its entries.
///
/// Every length-delimited entry contributes its elements in order. Unpacked
/// entries of the element's own wire type are accepted too, except for
/// length-delimited elements, where every entry is read as a run.
pub(crate) fn decode_packed<'a, I>(
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
        match &entry.payload {
            Payload::Len(raw) => decode_packed_into(of, registry, raw, depth, &mut items)?,
            payload if payload.wire_type() == of.wire_type() => {
                items.push(of.decode_nested(registry, payload, depth)?)
            }
            _ => (),
        }
    }
    Ok(items)
}

/// Append every element packed into `raw` to `items`.
pub(crate) fn decode_packed_into(
    of: &ScalarCodec,
    registry: &Registry,
    raw: &Bytes,
    depth: u32,
    items: &mut Vec<Value>,
) -> Result<(), DecodeError> {
    let wire_type = of.wire_type();
    let mut buf = raw.clone();
    while buf.has_remaining() {
        let payload = Payload::decode(wire_type, &mut buf)?;
        items.push(of.decode_nested(registry, &payload, depth)?);
    }
    Ok(())
}

/// Encode `items` as one packed entry. An empty list produces no entry.
pub(crate) fn encode_packed(
    of: &ScalarCodec,
    registry: &Registry,
    tag: u32,
    items: &[Value],
) -> Result<Option<WireEntry>, EncodeError> {
    if items.is_empty() {
        return Ok(None);
    }

    let mut buf = Vec::new();
    for item in items {
        of.encode(registry, item)?.encode(&mut buf);
    }
    Ok(Some(WireEntry::new(tag, Payload::Len(Bytes::from(buf)))))
}
