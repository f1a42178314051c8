//! Resolved field tables handed to renderers.

use std::fmt;
use std::sync::Arc;

use protoflex::codec::{FieldCodec, ScalarType};
use protoflex::schema::DefaultValue;
use protoflex::wire::WireType;
use protoflex::{EnumSchema, MessageSchema, Registry, SchemaError};

use crate::ast::Syntax;
use crate::Error;

/// A field's element type after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(ScalarType),
    /// Fully-qualified enum name.
    Enum(String),
    /// Fully-qualified message name.
    Message(String),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(ty) => write!(f, "{ty}"),
            TypeRef::Enum(name) => write!(f, "enum {name}"),
            TypeRef::Message(name) => write!(f, "message {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Singular(TypeRef),
    Repeated(TypeRef),
    Map { key: ScalarType, value: TypeRef },
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Singular(ty) => write!(f, "{ty}"),
            FieldKind::Repeated(ty) => write!(f, "repeated {ty}"),
            FieldKind::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

/// One row of a message's field table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub id: u32,
    pub kind: FieldKind,
    pub wire_type: WireType,
    pub packed: bool,
    /// Runtime codec bound to this field.
    pub codec: FieldCodec,
    pub default: DefaultValue,
    /// Name of the oneof group this field belongs to.
    pub oneof: Option<String>,
    /// Whether the field lies on a cycle of message references.
    pub recursive: bool,
}

fn wire_name(wire_type: WireType) -> &'static str {
    match wire_type {
        WireType::Varint => "VARINT",
        WireType::I64 => "I64",
        WireType::Len => "LEN",
        WireType::I32 => "I32",
    }
}

impl fmt::Display for ResolvedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {} ({}", self.id, self.name, self.kind, wire_name(self.wire_type))?;
        if self.packed {
            f.write_str(", packed")?;
        }
        write!(f, ") = {}", self.default)?;
        if let Some(group) = &self.oneof {
            write!(f, " [oneof {group}]")?;
        }
        if self.recursive {
            f.write_str(" [recursive]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMessage {
    /// Fully-qualified name, e.g. `pkg.Outer.Inner`.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<ResolvedField>,
}

impl ResolvedMessage {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build the runtime schema for this message.
    pub fn schema(&self) -> Result<MessageSchema, SchemaError> {
        self.fields
            .iter()
            .fold(MessageSchema::builder(&self.name), |builder, field| {
                builder.push(&field.name, field.id, field.codec.clone(), field.oneof.as_deref())
            })
            .build()
    }
}

impl fmt::Display for ResolvedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message {}", self.name)?;
        for field in &self.fields {
            write!(f, "\n  {field}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub path: String,
    pub syntax: Syntax,
    pub package: Option<String>,
    /// Messages in declaration order, outer before nested.
    pub messages: Vec<ResolvedMessage>,
    pub enums: Vec<Arc<EnumSchema>>,
}

impl ResolvedFile {
    pub fn message(&self, name: &str) -> Option<&ResolvedMessage> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Arc<EnumSchema>> {
        self.enums.iter().find(|e| e.name() == name)
    }
}

impl fmt::Display for ResolvedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file {} ({}", self.path, self.syntax)?;
        if let Some(package) = &self.package {
            write!(f, ", package {package}")?;
        }
        f.write_str(")")?;

        for schema in &self.enums {
            write!(f, "\nenum {} {{", schema.name())?;
            for (i, (member, number)) in schema.values().iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{sep}{member} = {number}")?;
            }
            f.write_str(" }")?;
        }
        for message in &self.messages {
            write!(f, "\n{message}")?;
        }
        Ok(())
    }
}

/// The outcome of resolving an entry file and its imports.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Every file after the files it imports.
    pub(crate) files: Vec<ResolvedFile>,
    /// Index of the entry file in `files`.
    pub(crate) entry: usize,
}

impl Resolution {
    pub fn entry(&self) -> &ResolvedFile {
        &self.files[self.entry]
    }

    pub fn files(&self) -> &[ResolvedFile] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&ResolvedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Look a message up by fully-qualified name across all files.
    pub fn message(&self, name: &str) -> Option<&ResolvedMessage> {
        self.files.iter().find_map(|f| f.message(name))
    }

    /// Build a runtime [`Registry`] holding every enum and message of the
    /// entry file and its imports.
    pub fn registry(&self) -> Result<Registry, Error> {
        let mut registry = Registry::new();
        for file in &self.files {
            for schema in &file.enums {
                registry.insert_enum(EnumSchema::clone(schema))?;
            }
            for message in &file.messages {
                registry.insert_message(message.schema()?)?;
            }
        }
        Ok(registry)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, file) in self.files.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{file}")?;
        }
        Ok(())
    }
}
