//! Immutable runtime schemas: message field tables, enum member tables, and
//! the [`Registry`] that ties them together by name.
//!
//! Schemas are validated once at construction. After that they are only read,
//! so a [`Registry`] can be shared between threads and used by any number of
//! concurrent encode/decode calls.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::codec::{self, FieldCodec, ScalarCodec, ScalarType};
use crate::error::{DecodeError, EncodeError, JsonError, SchemaError};
use crate::value::{MessageValue, Value};
use crate::wire::{MAXIMUM_TAG_VAL, MINIMUM_TAG_VAL};

/// An enum: its name and ordered `(member, number)` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    name: String,
    values: Vec<(String, i32)>,
    zero: usize,
}

impl EnumSchema {
    /// Build an enum from its members. One member must have the value 0.
    pub fn new<N, I>(name: impl Into<String>, values: I) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, i32)>,
    {
        let name = name.into();
        let values: Vec<(String, i32)> = values
            .into_iter()
            .map(|(member, number)| (member.into(), number))
            .collect();
        let zero = values
            .iter()
            .position(|(_, number)| *number == 0)
            .ok_or_else(|| SchemaError::MissingEnumZero { name: name.clone() })?;
        Ok(EnumSchema { name, values, zero })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[(String, i32)] {
        &self.values
    }

    /// The member with value 0, used as the default.
    pub fn zero_member(&self) -> &str {
        &self.values[self.zero].0
    }

    /// Name of the first member with value `number`.
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(member, _)| member.as_str())
    }

    pub fn number_of(&self, member: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(m, _)| m == member)
            .map(|(_, number)| *number)
    }

    pub fn contains(&self, number: i32) -> bool {
        self.values.iter().any(|(_, n)| *n == number)
    }
}

/// What a field holds before anything is assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Zero of the primitive: `0`, `false`, `""` or empty bytes.
    Scalar(ScalarType),
    /// The enum member with value 0.
    Enum { name: String },
    /// The zero instance of the named message.
    Message(String),
    EmptyList,
    EmptyMap,
    /// Oneof members, which start with no member populated.
    Absent,
}

impl DefaultValue {
    /// Build the native default, or `None` when the field starts absent.
    pub fn materialize(&self, registry: &Registry) -> Option<Value> {
        self.materialize_guarded(registry, &mut Vec::new())
    }

    fn materialize_guarded(&self, registry: &Registry, visiting: &mut Vec<String>) -> Option<Value> {
        match self {
            DefaultValue::Scalar(ty) => Some(ty.default_value()),
            DefaultValue::Enum { .. } => Some(Value::Enum(0)),
            DefaultValue::Message(name) => {
                // A message reachable from itself stays absent instead of
                // expanding forever.
                if visiting.iter().any(|v| v == name) {
                    return None;
                }
                let schema = registry.message(name)?;
                let mut instance = MessageValue::new();
                registry.fill_defaults_guarded(schema, &mut instance, visiting);
                Some(Value::Message(instance))
            }
            DefaultValue::EmptyList => Some(Value::List(Vec::new())),
            DefaultValue::EmptyMap => Some(Value::Map(BTreeMap::new())),
            DefaultValue::Absent => None,
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Scalar(ScalarType::Bool) => f.write_str("false"),
            DefaultValue::Scalar(ScalarType::Float | ScalarType::Double) => f.write_str("0.0"),
            DefaultValue::Scalar(ScalarType::String) => f.write_str("\"\""),
            DefaultValue::Scalar(ScalarType::Bytes) => f.write_str("b\"\""),
            DefaultValue::Scalar(_) => f.write_str("0"),
            DefaultValue::Enum { name } => f.write_str(name),
            DefaultValue::Message(_) => f.write_str("{..}"),
            DefaultValue::EmptyList => f.write_str("[]"),
            DefaultValue::EmptyMap => f.write_str("{}"),
            DefaultValue::Absent => f.write_str("absent"),
        }
    }
}

/// One entry of a message's field table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    id: u32,
    codec: FieldCodec,
    oneof: Option<usize>,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    /// Index of the oneof group this field belongs to, if any.
    pub fn oneof(&self) -> Option<usize> {
        self.oneof
    }

    pub fn default_value(&self) -> DefaultValue {
        match self.oneof {
            Some(_) => DefaultValue::Absent,
            None => self.codec.default_value(),
        }
    }
}

/// A oneof group: its name and the indices of its member fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofSpec {
    name: String,
    fields: Vec<usize>,
}

impl OneofSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indices into [`MessageSchema::fields`].
    pub fn fields(&self) -> &[usize] {
        &self.fields
    }
}

/// A message's field table, in declaration order and indexed by id.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    name: String,
    fields: Vec<FieldSpec>,
    oneofs: Vec<OneofSpec>,
    by_id: HashMap<u32, usize>,
}

impl MessageSchema {
    pub fn builder(name: impl Into<String>) -> MessageSchemaBuilder {
        MessageSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields, oneof members included, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_id(&self, id: u32) -> Option<&FieldSpec> {
        self.by_id.get(&id).map(|idx| &self.fields[*idx])
    }

    pub fn oneofs(&self) -> &[OneofSpec] {
        &self.oneofs
    }
}

impl PartialEq for MessageSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields && self.oneofs == other.oneofs
    }
}

/// Builder for [`MessageSchema`]; validates the table on [`build`].
///
/// [`build`]: MessageSchemaBuilder::build
#[derive(Debug, Clone)]
pub struct MessageSchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    oneofs: Vec<OneofSpec>,
}

impl MessageSchemaBuilder {
    /// Append a plain field.
    pub fn field(mut self, name: impl Into<String>, id: u32, codec: impl Into<FieldCodec>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            id,
            codec: codec.into(),
            oneof: None,
        });
        self
    }

    /// Append a oneof group and its members.
    pub fn oneof<N, C, I>(mut self, group: impl Into<String>, members: I) -> Self
    where
        N: Into<String>,
        C: Into<ScalarCodec>,
        I: IntoIterator<Item = (N, u32, C)>,
    {
        let index = self.oneofs.len();
        let mut fields = Vec::new();
        for (name, id, codec) in members {
            fields.push(self.fields.len());
            self.fields.push(FieldSpec {
                name: name.into(),
                id,
                codec: FieldCodec::Scalar(codec.into()),
                oneof: Some(index),
            });
        }
        self.oneofs.push(OneofSpec {
            name: group.into(),
            fields,
        });
        self
    }

    /// Append a field that was already resolved elsewhere, keeping its
    /// oneof membership by group name.
    pub fn push(mut self, name: impl Into<String>, id: u32, codec: FieldCodec, oneof: Option<&str>) -> Self {
        let oneof = oneof.map(|group| {
            match self.oneofs.iter().position(|o| o.name == group) {
                Some(index) => index,
                None => {
                    self.oneofs.push(OneofSpec {
                        name: group.to_string(),
                        fields: Vec::new(),
                    });
                    self.oneofs.len() - 1
                }
            }
        });
        if let Some(index) = oneof {
            self.oneofs[index].fields.push(self.fields.len());
        }
        self.fields.push(FieldSpec {
            name: name.into(),
            id,
            codec,
            oneof,
        });
        self
    }

    pub fn build(self) -> Result<MessageSchema, SchemaError> {
        let mut by_id = HashMap::with_capacity(self.fields.len());
        let mut names = HashMap::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if field.id < MINIMUM_TAG_VAL || field.id > MAXIMUM_TAG_VAL {
                return Err(SchemaError::FieldIdOutOfRange {
                    message: self.name,
                    id: field.id,
                });
            }
            if by_id.insert(field.id, idx).is_some() {
                return Err(SchemaError::DuplicateFieldId {
                    message: self.name,
                    id: field.id,
                });
            }
            if names.insert(field.name.as_str(), idx).is_some() {
                return Err(SchemaError::DuplicateFieldName {
                    field: field.name.clone(),
                    message: self.name,
                });
            }
            if field.oneof.is_some() && matches!(field.codec, FieldCodec::Composite(_)) {
                return Err(SchemaError::CompositeOneofMember {
                    field: field.name.clone(),
                    message: self.name,
                });
            }
        }

        Ok(MessageSchema {
            name: self.name,
            fields: self.fields,
            oneofs: self.oneofs,
            by_id,
        })
    }
}

/// Every message and enum known to an application, by name.
///
/// Nested message codecs refer to their target by name, so a message can
/// reference itself or a message registered later.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    messages: BTreeMap<String, MessageSchema>,
    enums: BTreeMap<String, Arc<EnumSchema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_message(&mut self, schema: MessageSchema) -> Result<(), SchemaError> {
        if self.messages.contains_key(&schema.name) {
            return Err(SchemaError::DuplicateSymbol { name: schema.name });
        }
        self.messages.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Register an enum, returning the shared handle enum codecs bind to.
    pub fn insert_enum(&mut self, schema: EnumSchema) -> Result<Arc<EnumSchema>, SchemaError> {
        if self.enums.contains_key(&schema.name) {
            return Err(SchemaError::DuplicateSymbol { name: schema.name });
        }
        let schema = Arc::new(schema);
        self.enums.insert(schema.name.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    pub fn message(&self, name: &str) -> Option<&MessageSchema> {
        self.messages.get(name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Arc<EnumSchema>> {
        self.enums.get(name)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageSchema> {
        self.messages.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumSchema>> {
        self.enums.values()
    }

    /// Decode a full instance of message `name`: every field the input left
    /// out is set to its default.
    pub fn decode(&self, name: &str, buf: impl Into<Bytes>) -> Result<MessageValue, DecodeError> {
        self.decode_nested(name, buf.into(), 0)
    }

    pub(crate) fn decode_nested(
        &self,
        name: &str,
        buf: Bytes,
        depth: u32,
    ) -> Result<MessageValue, DecodeError> {
        let schema = self
            .message(name)
            .ok_or_else(|| DecodeError::UnknownMessage { name: name.to_string() })?;
        let mut message = codec::decode_message_nested(self, schema, buf, depth)?;
        self.fill_defaults(schema, &mut message);
        Ok(message)
    }

    /// Decode a full instance of message `name` from JSON.
    pub fn decode_json(&self, name: &str, json: &serde_json::Value) -> Result<MessageValue, JsonError> {
        let schema = self
            .message(name)
            .ok_or_else(|| JsonError::UnknownMessage { name: name.to_string() })?;
        let mut message = codec::decode_message_json(self, schema, json)?;
        self.fill_defaults(schema, &mut message);
        Ok(message)
    }

    pub fn encode(&self, name: &str, message: &MessageValue) -> Result<Vec<u8>, EncodeError> {
        let schema = self.encode_schema(name)?;
        codec::encode_message_to_vec(self, schema, message)
    }

    pub fn encode_json(&self, name: &str, message: &MessageValue) -> Result<serde_json::Value, EncodeError> {
        let schema = self.encode_schema(name)?;
        codec::encode_message_json(self, schema, message)
    }

    /// The zero instance of message `name`.
    pub fn default_instance(&self, name: &str) -> Option<MessageValue> {
        match DefaultValue::Message(name.to_string()).materialize(self)? {
            Value::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Set every absent non-oneof field of `message` to its default.
    pub fn fill_defaults(&self, schema: &MessageSchema, message: &mut MessageValue) {
        self.fill_defaults_guarded(schema, message, &mut Vec::new());
    }

    fn fill_defaults_guarded(
        &self,
        schema: &MessageSchema,
        message: &mut MessageValue,
        visiting: &mut Vec<String>,
    ) {
        visiting.push(schema.name.clone());
        for field in &schema.fields {
            if field.oneof.is_some() || message.contains(&field.name) {
                continue;
            }
            if let Some(value) = field.default_value().materialize_guarded(self, visiting) {
                message.set(field.name.clone(), value);
            }
        }
        visiting.pop();
    }

    fn encode_schema(&self, name: &str) -> Result<&MessageSchema, EncodeError> {
        self.message(name)
            .ok_or_else(|| EncodeError::UnknownMessage { name: name.to_string() })
    }
}
