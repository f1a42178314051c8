//! Enum codec: a varint on the wire, a member name in JSON.

use crate::error::{DecodeError, EncodeError, JsonError};
use crate::schema::EnumSchema;
use crate::value::Value;
use crate::wire::{Payload, WireType};

type Json = serde_json::Value;

impl EnumSchema {
    /// Unknown numbers decode to 0 rather than failing.
    pub fn decode(&self, payload: &Payload) -> Result<Value, DecodeError> {
        match payload {
            Payload::Varint(raw) => {
                let number = *raw as i32;
                Ok(Value::Enum(if self.contains(number) { number } else { 0 }))
            }
            other => Err(DecodeError::WireTypeMismatch {
                expected: WireType::Varint,
                actual: other.wire_type(),
            }),
        }
    }

    pub fn encode(&self, value: &Value) -> Result<Payload, EncodeError> {
        match value {
            Value::Enum(number) => Ok(Payload::Varint(i64::from(*number) as u64)),
            other => Err(EncodeError::mismatch("enum", other.kind())),
        }
    }

    /// Accepts a member name or the number of a declared member.
    pub fn from_json(&self, json: &Json) -> Result<Value, JsonError> {
        match json {
            Json::String(member) => self.number_of(member).map(Value::Enum).ok_or_else(|| {
                JsonError::UnknownEnumMember {
                    enum_name: self.name().to_string(),
                    name: member.clone(),
                }
            }),
            Json::Number(n) => {
                let number = n
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .filter(|n| self.contains(*n))
                    .ok_or_else(|| JsonError::UnknownEnumMember {
                        enum_name: self.name().to_string(),
                        name: n.to_string(),
                    })?;
                Ok(Value::Enum(number))
            }
            _ => Err(JsonError::malformed("enum member name or number")),
        }
    }

    /// Writes the member name; a number with no member is written as is.
    pub fn to_json(&self, value: &Value) -> Result<Json, EncodeError> {
        match value {
            Value::Enum(number) => Ok(match self.name_of(*number) {
                Some(member) => Json::String(member.to_string()),
                None => Json::from(*number),
            }),
            other => Err(EncodeError::mismatch("enum", other.kind())),
        }
    }
}
