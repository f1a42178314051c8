//! `FileDescriptorSet` input.
//!
//! A `FileDescriptorSet` (what `protoc --descriptor_set_out` writes) is an
//! alternative to building [`ProtoFile`]s by hand. The types here mirror the
//! subset of google/protobuf/descriptor.proto the resolver needs, and are
//! decoded with the protoflex runtime itself.

use bytes::Bytes;
use protoflex::codec::{self, CompositeCodec, ScalarType};
use protoflex::{DecodeError, MessageSchema, MessageValue, Registry, SchemaError, Value};

use crate::ast::{self, ImportKind, MessageItem, ProtoFile, Statement, Syntax};
use crate::source::{MemorySource, SchemaSource};
use crate::Error;

const FILE_DESCRIPTOR_SET: &str = "google.protobuf.FileDescriptorSet";
const FILE_DESCRIPTOR_PROTO: &str = "google.protobuf.FileDescriptorProto";
const DESCRIPTOR_PROTO: &str = "google.protobuf.DescriptorProto";
const FIELD_DESCRIPTOR_PROTO: &str = "google.protobuf.FieldDescriptorProto";
const ONEOF_DESCRIPTOR_PROTO: &str = "google.protobuf.OneofDescriptorProto";
const ENUM_DESCRIPTOR_PROTO: &str = "google.protobuf.EnumDescriptorProto";
const ENUM_VALUE_DESCRIPTOR_PROTO: &str = "google.protobuf.EnumValueDescriptorProto";
const MESSAGE_OPTIONS: &str = "google.protobuf.MessageOptions";
const FIELD_OPTIONS: &str = "google.protobuf.FieldOptions";

/// Runtime schemas for the descriptor subset.
///
/// Nested messages are declared as `bytes` and decoded one level at a time,
/// so each level keeps field presence: a decoded submessage would come back
/// with its defaults filled in, and `oneof_index = 0` must stay distinct
/// from an unset index.
pub fn descriptor_registry() -> Result<Registry, SchemaError> {
    let messages = [
        MessageSchema::builder(FILE_DESCRIPTOR_SET)
            .field("file", 1, CompositeCodec::repeated(ScalarType::Bytes))
            .build()?,
        MessageSchema::builder(FILE_DESCRIPTOR_PROTO)
            .field("name", 1, ScalarType::String)
            .field("package", 2, ScalarType::String)
            .field("dependency", 3, CompositeCodec::repeated(ScalarType::String))
            .field("message_type", 4, CompositeCodec::repeated(ScalarType::Bytes))
            .field("enum_type", 5, CompositeCodec::repeated(ScalarType::Bytes))
            .field("public_dependency", 10, CompositeCodec::repeated(ScalarType::Int32))
            .field("weak_dependency", 11, CompositeCodec::repeated(ScalarType::Int32))
            .field("syntax", 12, ScalarType::String)
            .build()?,
        MessageSchema::builder(DESCRIPTOR_PROTO)
            .field("name", 1, ScalarType::String)
            .field("field", 2, CompositeCodec::repeated(ScalarType::Bytes))
            .field("nested_type", 3, CompositeCodec::repeated(ScalarType::Bytes))
            .field("enum_type", 4, CompositeCodec::repeated(ScalarType::Bytes))
            .field("options", 7, ScalarType::Bytes)
            .field("oneof_decl", 8, CompositeCodec::repeated(ScalarType::Bytes))
            .build()?,
        MessageSchema::builder(FIELD_DESCRIPTOR_PROTO)
            .field("name", 1, ScalarType::String)
            .field("number", 3, ScalarType::Int32)
            .field("label", 4, ScalarType::Int32)
            .field("type", 5, ScalarType::Int32)
            .field("type_name", 6, ScalarType::String)
            .field("options", 8, ScalarType::Bytes)
            .field("oneof_index", 9, ScalarType::Int32)
            .field("proto3_optional", 17, ScalarType::Bool)
            .build()?,
        MessageSchema::builder(ONEOF_DESCRIPTOR_PROTO)
            .field("name", 1, ScalarType::String)
            .build()?,
        MessageSchema::builder(ENUM_DESCRIPTOR_PROTO)
            .field("name", 1, ScalarType::String)
            .field("value", 2, CompositeCodec::repeated(ScalarType::Bytes))
            .build()?,
        MessageSchema::builder(ENUM_VALUE_DESCRIPTOR_PROTO)
            .field("name", 1, ScalarType::String)
            .field("number", 2, ScalarType::Int32)
            .build()?,
        MessageSchema::builder(MESSAGE_OPTIONS)
            .field("map_entry", 7, ScalarType::Bool)
            .build()?,
        MessageSchema::builder(FIELD_OPTIONS)
            .field("packed", 2, ScalarType::Bool)
            .build()?,
    ];

    let mut registry = Registry::new();
    for message in messages {
        registry.insert_message(message)?;
    }
    Ok(registry)
}

/// Decode a FileDescriptorSet from protobuf binary data.
pub fn decode_file_descriptor_set(data: impl Into<Bytes>) -> Result<FileDescriptorSet, Error> {
    let reader = Reader {
        registry: descriptor_registry()?,
    };
    let set = reader.read(FILE_DESCRIPTOR_SET, data.into())?;
    let file = reader
        .each(&set, "file", FILE_DESCRIPTOR_PROTO)?
        .iter()
        .map(|file| FileDescriptorProto::read(&reader, file))
        .collect::<Result<_, _>>()?;
    Ok(FileDescriptorSet { file })
}

struct Reader {
    registry: Registry,
}

impl Reader {
    fn read(&self, name: &str, data: Bytes) -> Result<MessageValue, DecodeError> {
        let schema = self
            .registry
            .message(name)
            .ok_or_else(|| DecodeError::UnknownMessage { name: name.to_string() })?;
        codec::decode_message(&self.registry, schema, data)
    }

    /// Decode every element of the embedded-message list `field` as `name`.
    fn each(&self, message: &MessageValue, field: &str, name: &str) -> Result<Vec<MessageValue>, DecodeError> {
        list(message, field)
            .filter_map(|item| match item {
                Value::Bytes(data) => Some(self.read(name, data.clone())),
                _ => None,
            })
            .collect()
    }

    fn optional(&self, message: &MessageValue, field: &str, name: &str) -> Result<Option<MessageValue>, DecodeError> {
        match message.get(field) {
            Some(Value::Bytes(data)) => self.read(name, data.clone()).map(Some),
            _ => Ok(None),
        }
    }
}

fn string(message: &MessageValue, field: &str) -> Option<String> {
    message.get(field).and_then(Value::as_str).map(str::to_string)
}

fn int32(message: &MessageValue, field: &str) -> Option<i32> {
    match message.get(field) {
        Some(Value::I32(v)) => Some(*v),
        _ => None,
    }
}

fn boolean(message: &MessageValue, field: &str) -> Option<bool> {
    match message.get(field) {
        Some(Value::Bool(v)) => Some(*v),
        _ => None,
    }
}

fn int32_list(message: &MessageValue, field: &str) -> Vec<i32> {
    list(message, field)
        .filter_map(|v| match v {
            Value::I32(v) => Some(*v),
            _ => None,
        })
        .collect()
}

fn list<'a>(message: &'a MessageValue, field: &str) -> impl Iterator<Item = &'a Value> {
    message.get(field).and_then(Value::as_list).unwrap_or_default().iter()
}

/// A collection of file descriptors.
/// Corresponds to google.protobuf.FileDescriptorSet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptorSet {
    pub file: Vec<FileDescriptorProto>,
}

/// Describes a complete .proto file.
/// Corresponds to google.protobuf.FileDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptorProto {
    /// The file name, relative to root of source tree.
    pub name: Option<String>,
    pub package: Option<String>,
    /// Names of files imported by this file.
    pub dependency: Vec<String>,
    /// Indexes into `dependency` of the public imports.
    pub public_dependency: Vec<i32>,
    /// Indexes into `dependency` of the weak imports.
    pub weak_dependency: Vec<i32>,
    pub message_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    /// The syntax of the proto file (e.g., "proto2", "proto3").
    pub syntax: Option<String>,
}

impl FileDescriptorProto {
    fn read(reader: &Reader, message: &MessageValue) -> Result<Self, DecodeError> {
        Ok(FileDescriptorProto {
            name: string(message, "name"),
            package: string(message, "package"),
            dependency: list(message, "dependency")
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            public_dependency: int32_list(message, "public_dependency"),
            weak_dependency: int32_list(message, "weak_dependency"),
            message_type: reader
                .each(message, "message_type", DESCRIPTOR_PROTO)?
                .iter()
                .map(|m| DescriptorProto::read(reader, m))
                .collect::<Result<_, _>>()?,
            enum_type: reader
                .each(message, "enum_type", ENUM_DESCRIPTOR_PROTO)?
                .iter()
                .map(|e| EnumDescriptorProto::read(reader, e))
                .collect::<Result<_, _>>()?,
            syntax: string(message, "syntax"),
        })
    }
}

/// Describes a message type.
/// Corresponds to google.protobuf.DescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorProto {
    pub name: Option<String>,
    pub field: Vec<FieldDescriptorProto>,
    pub nested_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub options: Option<MessageOptions>,
    pub oneof_decl: Vec<OneofDescriptorProto>,
}

impl DescriptorProto {
    fn read(reader: &Reader, message: &MessageValue) -> Result<Self, DecodeError> {
        Ok(DescriptorProto {
            name: string(message, "name"),
            field: reader
                .each(message, "field", FIELD_DESCRIPTOR_PROTO)?
                .iter()
                .map(|f| FieldDescriptorProto::read(reader, f))
                .collect::<Result<_, _>>()?,
            nested_type: reader
                .each(message, "nested_type", DESCRIPTOR_PROTO)?
                .iter()
                .map(|m| DescriptorProto::read(reader, m))
                .collect::<Result<_, _>>()?,
            enum_type: reader
                .each(message, "enum_type", ENUM_DESCRIPTOR_PROTO)?
                .iter()
                .map(|e| EnumDescriptorProto::read(reader, e))
                .collect::<Result<_, _>>()?,
            options: reader
                .optional(message, "options", MESSAGE_OPTIONS)?
                .map(|options| MessageOptions {
                    map_entry: boolean(&options, "map_entry"),
                }),
            oneof_decl: reader
                .each(message, "oneof_decl", ONEOF_DESCRIPTOR_PROTO)?
                .iter()
                .map(|o| OneofDescriptorProto {
                    name: string(o, "name"),
                })
                .collect(),
        })
    }

    fn is_map_entry(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.map_entry)
            .unwrap_or(false)
    }
}

/// Describes a field within a message.
/// Corresponds to google.protobuf.FieldDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDescriptorProto {
    pub name: Option<String>,
    /// The field number (tag).
    pub number: Option<i32>,
    /// The field label (optional, required, repeated).
    pub label: Option<i32>,
    pub r#type: Option<i32>,
    /// For message and enum types, the fully-qualified type name.
    pub type_name: Option<String>,
    pub options: Option<FieldOptions>,
    /// If set, this field is part of a oneof.
    pub oneof_index: Option<i32>,
    /// If true, this is a proto3 optional field.
    pub proto3_optional: Option<bool>,
}

impl FieldDescriptorProto {
    fn read(reader: &Reader, message: &MessageValue) -> Result<Self, DecodeError> {
        Ok(FieldDescriptorProto {
            name: string(message, "name"),
            number: int32(message, "number"),
            label: int32(message, "label"),
            r#type: int32(message, "type"),
            type_name: string(message, "type_name"),
            options: reader
                .optional(message, "options", FIELD_OPTIONS)?
                .map(|options| FieldOptions {
                    packed: boolean(&options, "packed"),
                }),
            oneof_index: int32(message, "oneof_index"),
            proto3_optional: boolean(message, "proto3_optional"),
        })
    }

    /// Get the field label.
    pub fn label(&self) -> Label {
        self.label.and_then(Label::from_i32).unwrap_or(Label::Optional)
    }

    /// Get the field type.
    pub fn field_type(&self) -> Option<Type> {
        self.r#type.and_then(Type::from_i32)
    }

    /// The oneof this field belongs to, ignoring the synthetic oneofs that
    /// back proto3 `optional` fields.
    fn real_oneof(&self) -> Option<usize> {
        if self.proto3_optional == Some(true) {
            return None;
        }
        self.oneof_index.and_then(|i| usize::try_from(i).ok())
    }
}

/// Describes an enum type.
/// Corresponds to google.protobuf.EnumDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumDescriptorProto {
    pub name: Option<String>,
    pub value: Vec<EnumValueDescriptorProto>,
}

impl EnumDescriptorProto {
    fn read(reader: &Reader, message: &MessageValue) -> Result<Self, DecodeError> {
        Ok(EnumDescriptorProto {
            name: string(message, "name"),
            value: reader
                .each(message, "value", ENUM_VALUE_DESCRIPTOR_PROTO)?
                .iter()
                .map(|v| EnumValueDescriptorProto {
                    name: string(v, "name"),
                    number: int32(v, "number"),
                })
                .collect(),
        })
    }
}

/// Describes an enum value.
/// Corresponds to google.protobuf.EnumValueDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueDescriptorProto {
    pub name: Option<String>,
    pub number: Option<i32>,
}

/// Describes a oneof.
/// Corresponds to google.protobuf.OneofDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneofDescriptorProto {
    pub name: Option<String>,
}

/// Options for a message type.
/// Corresponds to google.protobuf.MessageOptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOptions {
    /// Set true if this message is a map entry type.
    pub map_entry: Option<bool>,
}

/// Options for a field.
/// Corresponds to google.protobuf.FieldOptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub packed: Option<bool>,
}

/// Field type enumeration.
/// Corresponds to google.protobuf.FieldDescriptorProto.Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Type {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl Type {
    /// Convert from i32.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Double),
            2 => Some(Self::Float),
            3 => Some(Self::Int64),
            4 => Some(Self::Uint64),
            5 => Some(Self::Int32),
            6 => Some(Self::Fixed64),
            7 => Some(Self::Fixed32),
            8 => Some(Self::Bool),
            9 => Some(Self::String),
            10 => Some(Self::Group),
            11 => Some(Self::Message),
            12 => Some(Self::Bytes),
            13 => Some(Self::Uint32),
            14 => Some(Self::Enum),
            15 => Some(Self::Sfixed32),
            16 => Some(Self::Sfixed64),
            17 => Some(Self::Sint32),
            18 => Some(Self::Sint64),
            _ => None,
        }
    }

    /// The primitive this type denotes, if it is one.
    pub fn scalar(self) -> Option<ScalarType> {
        let ty = match self {
            Type::Double => ScalarType::Double,
            Type::Float => ScalarType::Float,
            Type::Int64 => ScalarType::Int64,
            Type::Uint64 => ScalarType::Uint64,
            Type::Int32 => ScalarType::Int32,
            Type::Fixed64 => ScalarType::Fixed64,
            Type::Fixed32 => ScalarType::Fixed32,
            Type::Bool => ScalarType::Bool,
            Type::String => ScalarType::String,
            Type::Bytes => ScalarType::Bytes,
            Type::Uint32 => ScalarType::Uint32,
            Type::Sfixed32 => ScalarType::Sfixed32,
            Type::Sfixed64 => ScalarType::Sfixed64,
            Type::Sint32 => ScalarType::Sint32,
            Type::Sint64 => ScalarType::Sint64,
            Type::Group | Type::Message | Type::Enum => return None,
        };
        Some(ty)
    }
}

/// Field label enumeration.
/// Corresponds to google.protobuf.FieldDescriptorProto.Label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Label {
    Optional = 1,
    Required = 2,
    Repeated = 3,
}

impl Label {
    /// Convert from i32.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Optional),
            2 => Some(Self::Required),
            3 => Some(Self::Repeated),
            _ => None,
        }
    }
}

/// A [`SchemaSource`] serving the files of a `FileDescriptorSet`.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSource {
    files: MemorySource,
}

impl DescriptorSource {
    /// Decode a binary `FileDescriptorSet` and convert every file in it.
    pub fn decode(data: impl Into<Bytes>) -> Result<Self, Error> {
        Self::from_set(&decode_file_descriptor_set(data)?)
    }

    pub fn from_set(set: &FileDescriptorSet) -> Result<Self, Error> {
        let mut files = MemorySource::new();
        for file in &set.file {
            let name = file.name.as_deref().ok_or_else(|| Error::InvalidDescriptor {
                file: String::new(),
                reason: "file descriptor has no name".into(),
            })?;
            files.insert(name, convert_file(name, file)?);
        }
        Ok(DescriptorSource { files })
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.paths()
    }
}

impl SchemaSource for DescriptorSource {
    fn load(&self, path: &str) -> Option<ProtoFile> {
        self.files.load(path)
    }

    fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }
}

fn invalid(file: &str, reason: impl Into<String>) -> Error {
    Error::InvalidDescriptor {
        file: file.to_string(),
        reason: reason.into(),
    }
}

fn convert_file(name: &str, file: &FileDescriptorProto) -> Result<ProtoFile, Error> {
    let syntax = match file.syntax.as_deref() {
        Some("proto3") => Syntax::Proto3,
        // protoc leaves the field out for proto2 files.
        None | Some("") | Some("proto2") => Syntax::Proto2,
        Some(other) => {
            return Err(Error::UnsupportedSyntax {
                file: name.to_string(),
                syntax: other.to_string(),
            })
        }
    };

    let mut proto = ProtoFile::new().syntax(syntax);
    if let Some(package) = file.package.as_deref().filter(|p| !p.is_empty()) {
        proto = proto.package(package);
    }
    for (index, dependency) in file.dependency.iter().enumerate() {
        let index = i32::try_from(index).map_err(|_| invalid(name, "too many dependencies"))?;
        let kind = if file.public_dependency.contains(&index) {
            ImportKind::Public
        } else if file.weak_dependency.contains(&index) {
            ImportKind::Weak
        } else {
            ImportKind::Default
        };
        proto = proto.import_with(dependency, kind);
    }
    for message in &file.message_type {
        proto.statements.push(Statement::Message(convert_message(name, message)?));
    }
    for enumeration in &file.enum_type {
        proto.statements.push(Statement::Enum(convert_enum(name, enumeration)?));
    }
    Ok(proto)
}

fn convert_message(file: &str, message: &DescriptorProto) -> Result<ast::Message, Error> {
    let name = message
        .name
        .as_deref()
        .ok_or_else(|| invalid(file, "message has no name"))?;
    let mut out = ast::Message::new(name);

    // Position in `out.items` of each oneof already started.
    let mut oneofs: Vec<Option<usize>> = vec![None; message.oneof_decl.len()];

    for field in &message.field {
        if let Some(entry) = map_entry(message, field) {
            out.items.push(MessageItem::MapField(convert_map_field(file, field, entry)?));
            continue;
        }

        let converted = convert_field(file, field)?;
        match field.real_oneof() {
            Some(index) => {
                let decl = message
                    .oneof_decl
                    .get(index)
                    .ok_or_else(|| invalid(file, format!("{name}: oneof index {index} out of range")))?;
                match oneofs[index] {
                    Some(position) => match &mut out.items[position] {
                        MessageItem::Oneof(oneof) => oneof.fields.push(converted),
                        _ => return Err(invalid(file, format!("{name}: oneof {index} misplaced"))),
                    },
                    None => {
                        let group = decl
                            .name
                            .as_deref()
                            .ok_or_else(|| invalid(file, format!("{name}: oneof has no name")))?;
                        oneofs[index] = Some(out.items.len());
                        out.items.push(MessageItem::Oneof(ast::Oneof {
                            name: group.to_string(),
                            fields: vec![converted],
                        }));
                    }
                }
            }
            None => out.items.push(MessageItem::Field(converted)),
        }
    }

    for nested in message.nested_type.iter().filter(|nested| !nested.is_map_entry()) {
        out.items.push(MessageItem::Message(convert_message(file, nested)?));
    }
    for enumeration in &message.enum_type {
        out.items.push(MessageItem::Enum(convert_enum(file, enumeration)?));
    }
    Ok(out)
}

/// The synthetic map-entry message a repeated field refers to, if any.
fn map_entry<'a>(message: &'a DescriptorProto, field: &FieldDescriptorProto) -> Option<&'a DescriptorProto> {
    if field.label() != Label::Repeated || field.field_type() != Some(Type::Message) {
        return None;
    }
    let target = field.type_name.as_deref()?;
    let short = target.rsplit('.').next()?;
    message
        .nested_type
        .iter()
        .find(|nested| nested.is_map_entry() && nested.name.as_deref() == Some(short))
}

fn convert_map_field(
    file: &str,
    field: &FieldDescriptorProto,
    entry: &DescriptorProto,
) -> Result<ast::MapField, Error> {
    let part = |number: i32| {
        entry
            .field
            .iter()
            .find(|f| f.number == Some(number))
            .ok_or_else(|| invalid(file, "map entry is missing its key or value"))
            .and_then(|f| type_name(file, f))
    };
    Ok(ast::MapField {
        name: field_name(file, field)?,
        id: field_number(file, field)?,
        key_type: part(1)?,
        value_type: part(2)?,
    })
}

fn convert_field(file: &str, field: &FieldDescriptorProto) -> Result<ast::Field, Error> {
    let mut out = ast::Field::new(field_name(file, field)?, field_number(file, field)?, type_name(file, field)?);
    if field.label() == Label::Repeated {
        out = out.repeated();
    }
    if let Some(packed) = field.options.as_ref().and_then(|o| o.packed) {
        out = out.option("packed", packed.to_string());
    }
    Ok(out)
}

fn field_name(file: &str, field: &FieldDescriptorProto) -> Result<String, Error> {
    field
        .name
        .clone()
        .ok_or_else(|| invalid(file, "field has no name"))
}

fn field_number(file: &str, field: &FieldDescriptorProto) -> Result<u32, Error> {
    field
        .number
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(file, format!("field {:?} has no valid number", field.name)))
}

fn type_name(file: &str, field: &FieldDescriptorProto) -> Result<String, Error> {
    match field.field_type() {
        Some(Type::Group) => Err(invalid(file, "groups are not supported")),
        Some(ty) => match ty.scalar() {
            Some(scalar) => Ok(scalar.proto_name().to_string()),
            None => field
                .type_name
                .clone()
                .ok_or_else(|| invalid(file, format!("field {:?} has no type name", field.name))),
        },
        // Parsers may leave the type unset when only the name is known.
        None => field
            .type_name
            .clone()
            .ok_or_else(|| invalid(file, format!("field {:?} has no type", field.name))),
    }
}

fn convert_enum(file: &str, enumeration: &EnumDescriptorProto) -> Result<ast::Enum, Error> {
    let name = enumeration
        .name
        .as_deref()
        .ok_or_else(|| invalid(file, "enum has no name"))?;
    let values = enumeration
        .value
        .iter()
        .map(|value| match (&value.name, value.number) {
            (Some(name), Some(number)) => Ok((name.clone(), number)),
            _ => Err(invalid(file, format!("enum {name} has an incomplete value"))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ast::Enum::new(name, values))
}
