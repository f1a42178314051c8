//! JSON form of the primitive protobuf types.
//!
//! 64-bit integers are written as decimal strings so they survive consumers
//! that parse every number as a double. Parsing is lenient about how an
//! integer arrives (number, integral float, or numeric string) but strict
//! about its range.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use bytes::Bytes;
use serde_json::Number;

use super::ScalarType;
use crate::error::{EncodeError, JsonError};
use crate::value::Value;

type Json = serde_json::Value;

impl ScalarType {
    /// Convert a JSON value into a native value of this type.
    pub fn from_json(self, json: &Json) -> Result<Value, JsonError> {
        let value = match self {
            ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
                Value::I32(narrow(json_integer(json)?, self)?)
            }
            ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
                Value::I64(narrow(json_integer(json)?, self)?)
            }
            ScalarType::Uint32 | ScalarType::Fixed32 => {
                Value::U32(narrow(json_integer(json)?, self)?)
            }
            ScalarType::Uint64 | ScalarType::Fixed64 => {
                Value::U64(narrow(json_integer(json)?, self)?)
            }
            ScalarType::Bool => match json {
                Json::Bool(b) => Value::Bool(*b),
                _ => return Err(JsonError::malformed("boolean")),
            },
            ScalarType::Float => Value::F32(float_from_json(json)?),
            ScalarType::Double => Value::F64(double_from_json(json)?),
            ScalarType::String => match json {
                Json::String(s) => Value::String(s.clone()),
                _ => return Err(JsonError::malformed("string")),
            },
            ScalarType::Bytes => match json {
                Json::String(s) => Value::Bytes(bytes_from_base64(s)?),
                _ => return Err(JsonError::malformed("base64 string")),
            },
        };
        Ok(value)
    }

    /// Convert a native value of this type into JSON.
    pub fn to_json(self, value: &Value) -> Result<Json, EncodeError> {
        let json = match (self, value) {
            (
                ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32,
                Value::I32(v),
            ) => Json::from(*v),
            (
                ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64,
                Value::I64(v),
            ) => Json::String(v.to_string()),
            (ScalarType::Uint32 | ScalarType::Fixed32, Value::U32(v)) => Json::from(*v),
            (ScalarType::Uint64 | ScalarType::Fixed64, Value::U64(v)) => {
                Json::String(v.to_string())
            }
            (ScalarType::Bool, Value::Bool(v)) => Json::Bool(*v),
            (ScalarType::Float, Value::F32(v)) => float_to_json(f64::from(*v)),
            (ScalarType::Double, Value::F64(v)) => float_to_json(*v),
            (ScalarType::String, Value::String(v)) => Json::String(v.clone()),
            (ScalarType::Bytes, Value::Bytes(v)) => Json::String(STANDARD.encode(v)),
            (ty, other) => return Err(EncodeError::mismatch(ty.native_kind(), other.kind())),
        };
        Ok(json)
    }
}

/// Read an integer from a JSON number, an integral float, or a numeric string.
pub(crate) fn json_integer(json: &Json) -> Result<i128, JsonError> {
    match json {
        Json::Number(n) => number_integer(n),
        Json::String(s) => string_integer(s.trim()),
        _ => Err(JsonError::malformed("integer number or numeric string")),
    }
}

fn number_integer(n: &Number) -> Result<i128, JsonError> {
    if let Some(v) = n.as_i64() {
        return Ok(i128::from(v));
    }
    if let Some(v) = n.as_u64() {
        return Ok(i128::from(v));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i128),
        _ => Err(JsonError::malformed("integer")),
    }
}

fn string_integer(s: &str) -> Result<i128, JsonError> {
    if let Ok(v) = s.parse::<i128>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i128),
        _ => Err(JsonError::malformed("integer")),
    }
}

fn narrow<T: TryFrom<i128>>(value: i128, ty: ScalarType) -> Result<T, JsonError> {
    T::try_from(value).map_err(|_| JsonError::out_of_range(value, ty.proto_name()))
}

/// Any JSON number is accepted, as are the `"Infinity"` and `"-Infinity"`
/// tokens written for non-finite values. Any other string is accepted only
/// when it does not parse as a number, and then reads as NaN.
fn float_from_json(json: &Json) -> Result<f32, JsonError> {
    match json {
        Json::Number(n) => n
            .as_f64()
            .map(|f| f as f32)
            .ok_or(JsonError::malformed("number")),
        Json::String(s) if s == "Infinity" => Ok(f32::INFINITY),
        Json::String(s) if s == "-Infinity" => Ok(f32::NEG_INFINITY),
        Json::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if !f.is_nan() => Err(JsonError::malformed("number")),
            _ => Ok(f32::NAN),
        },
        _ => Err(JsonError::malformed("number")),
    }
}

/// Numbers and numeric strings are accepted, NaN is not.
fn double_from_json(json: &Json) -> Result<f64, JsonError> {
    let parsed = match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if !f.is_nan() => Ok(f),
        _ => Err(JsonError::malformed("number")),
    }
}

fn float_to_json(f: f64) -> Json {
    match Number::from_f64(f) {
        Some(n) => Json::Number(n),
        None if f.is_nan() => Json::String("NaN".to_string()),
        None if f > 0.0 => Json::String("Infinity".to_string()),
        None => Json::String("-Infinity".to_string()),
    }
}

/// Padding is dropped and the standard alphabet is folded onto the URL-safe
/// one, so either flavor is accepted. Output always uses the standard
/// alphabet with padding.
fn bytes_from_base64(text: &str) -> Result<Bytes, JsonError> {
    let normalized: String = text
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD
        .decode(normalized)
        .map(Bytes::from)
        .map_err(|_| JsonError::InvalidBase64)
}
