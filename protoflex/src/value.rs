//! Dynamic native values produced and consumed by the codecs.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

/// A native value of any field.
///
/// Integers keep the width and signedness of the protobuf type that produced
/// them, so `sint32`, `sfixed32` and `int32` all map to [`Value::I32`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    /// Numeric value of an enum member.
    Enum(i32),
    Message(MessageValue),
    List(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Bytes => Bytes,
    MessageValue => Message,
    Vec<Value> => List,
    BTreeMap<MapKey, Value> => Map,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Key of a map field. Only integral, bool and string types may key a map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl MapKey {
    /// Convert a native value into a key, if its variant can key a map.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(MapKey::Bool(v)),
            Value::I32(v) => Some(MapKey::I32(v)),
            Value::I64(v) => Some(MapKey::I64(v)),
            Value::U32(v) => Some(MapKey::U32(v)),
            Value::U64(v) => Some(MapKey::U64(v)),
            Value::String(v) => Some(MapKey::String(v)),
            _ => None,
        }
    }
}

/// The string form a key takes as a JSON object member name.
impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(v) => write!(f, "{v}"),
            MapKey::I32(v) => write!(f, "{v}"),
            MapKey::I64(v) => write!(f, "{v}"),
            MapKey::U32(v) => write!(f, "{v}"),
            MapKey::U64(v) => write!(f, "{v}"),
            MapKey::String(v) => f.write_str(v),
        }
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Bool(v) => Value::Bool(v),
            MapKey::I32(v) => Value::I32(v),
            MapKey::I64(v) => Value::I64(v),
            MapKey::U32(v) => Value::U32(v),
            MapKey::U64(v) => Value::U64(v),
            MapKey::String(v) => Value::String(v),
        }
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::String(value.to_string())
    }
}

impl From<i32> for MapKey {
    fn from(value: i32) -> Self {
        MapKey::I32(value)
    }
}

/// The populated member of a oneof group.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofValue {
    /// Name of the member field that holds `value`.
    pub field: String,
    pub value: Value,
}

impl OneofValue {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        OneofValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A message instance: its plain fields by name, plus one tagged union per
/// oneof group.
///
/// Plain fields and oneof groups are stored apart. A oneof group holds at most
/// one member, and setting a group replaces its whole value, so no member can
/// be present alongside a sibling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageValue {
    fields: BTreeMap<String, Value>,
    oneofs: BTreeMap<String, OneofValue>,
}

impl MessageValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MessageValue::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Builder-style [`MessageValue::set_oneof`].
    pub fn with_oneof(
        mut self,
        group: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set_oneof(group, field, value);
        self
    }

    /// Look up a field by name, including the populated member of any oneof.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).or_else(|| {
            self.oneofs
                .values()
                .find(|member| member.field == field)
                .map(|member| &member.value)
        })
    }

    /// Set a plain (non-oneof) field, returning the previous value.
    ///
    /// Members of a oneof are set through [`MessageValue::set_oneof`].
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Remove a plain field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// The populated member of `group`, if any.
    pub fn oneof(&self, group: &str) -> Option<&OneofValue> {
        self.oneofs.get(group)
    }

    /// Replace the value of `group` with `field = value`, returning the member
    /// that was populated before.
    pub fn set_oneof(
        &mut self,
        group: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<OneofValue> {
        self.oneofs
            .insert(group.into(), OneofValue::new(field, value))
    }

    /// Leave `group` with no populated member.
    pub fn clear_oneof(&mut self, group: &str) -> Option<OneofValue> {
        self.oneofs.remove(group)
    }

    /// Iterate the plain fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterate the populated oneof groups in name order.
    pub fn oneofs(&self) -> impl Iterator<Item = (&str, &OneofValue)> {
        self.oneofs.iter().map(|(group, member)| (group.as_str(), member))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.oneofs.is_empty()
    }

    /// A plain field only, ignoring oneof members.
    pub(crate) fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub(crate) fn insert_oneof(&mut self, group: String, member: OneofValue) {
        self.oneofs.insert(group, member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_oneof_replaces_sibling() {
        let mut msg = MessageValue::new().with_oneof("choice", "a", 1i32);
        assert_eq!(msg.get("a"), Some(&Value::I32(1)));

        let previous = msg.set_oneof("choice", "b", "two");
        assert_eq!(previous, Some(OneofValue::new("a", 1i32)));
        assert_eq!(msg.get("a"), None);
        assert_eq!(msg.get("b"), Some(&Value::from("two")));
    }

    #[test]
    fn test_plain_fields_and_oneofs_are_separate() {
        let mut msg = MessageValue::new()
            .with("name", "x")
            .with_oneof("choice", "a", true);
        assert!(msg.contains("name"));
        assert!(msg.contains("a"));

        assert_eq!(msg.clear_oneof("choice"), Some(OneofValue::new("a", true)));
        assert!(!msg.contains("a"));
        assert_eq!(msg.remove("name"), Some(Value::from("x")));
        assert!(msg.is_empty());
    }

    #[test]
    fn test_map_key_conversion() {
        assert_eq!(MapKey::from_value(Value::I64(-3)), Some(MapKey::I64(-3)));
        assert_eq!(MapKey::from_value(Value::F32(1.0)), None);
        assert_eq!(Value::from(MapKey::from("k")), Value::from("k"));
    }
}
