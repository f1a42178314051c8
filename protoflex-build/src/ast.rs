//! Parsed schema AST consumed by the resolver.
//!
//! This mirrors what a `.proto` parser produces, reduced to the nodes the
//! resolver needs. Files can be built by hand with the builder methods, or
//! obtained from a [`FileDescriptorSet`](crate::descriptor::DescriptorSource).

use std::fmt;

/// Schema language version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Proto2,
    Proto3,
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Proto2 => f.write_str("proto2"),
            Syntax::Proto3 => f.write_str("proto3"),
        }
    }
}

/// A single schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtoFile {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Syntax(Syntax),
    Package(String),
    Import(Import),
    Message(Message),
    Enum(Enum),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Default,
    /// Re-exported to every file importing the importer.
    Public,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub items: Vec<MessageItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageItem {
    Field(Field),
    Oneof(Oneof),
    MapField(MapField),
    Message(Message),
    Enum(Enum),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub id: u32,
    /// Type as written: a primitive name, or a (possibly qualified) message
    /// or enum name.
    pub type_name: String,
    pub repeated: bool,
    pub options: Vec<FieldOption>,
}

/// `[name = value]` option attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oneof {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapField {
    pub name: String,
    pub id: u32,
    pub key_type: String,
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumField {
    pub name: String,
    pub id: i32,
}

impl ProtoFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.statements.push(Statement::Syntax(syntax));
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.statements.push(Statement::Package(package.into()));
        self
    }

    pub fn import(self, path: impl Into<String>) -> Self {
        self.import_with(path, ImportKind::Default)
    }

    pub fn import_public(self, path: impl Into<String>) -> Self {
        self.import_with(path, ImportKind::Public)
    }

    pub fn import_with(mut self, path: impl Into<String>, kind: ImportKind) -> Self {
        self.statements.push(Statement::Import(Import {
            path: path.into(),
            kind,
        }));
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.statements.push(Statement::Message(message));
        self
    }

    pub fn enumeration(mut self, enumeration: Enum) -> Self {
        self.statements.push(Statement::Enum(enumeration));
        self
    }

    /// Walk every node of this file with `visitor`.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        for statement in &self.statements {
            match statement {
                Statement::Syntax(syntax) => visitor.visit_syntax(*syntax),
                Statement::Package(package) => visitor.visit_package(package),
                Statement::Import(import) => visitor.visit_import(import),
                Statement::Message(message) => visitor.visit_message(message),
                Statement::Enum(enumeration) => visitor.visit_enum(enumeration),
            }
        }
    }
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Message {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.items.push(MessageItem::Field(field));
        self
    }

    pub fn oneof(mut self, name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        self.items.push(MessageItem::Oneof(Oneof {
            name: name.into(),
            fields: fields.into_iter().collect(),
        }));
        self
    }

    pub fn map_field(
        mut self,
        name: impl Into<String>,
        id: u32,
        key_type: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        self.items.push(MessageItem::MapField(MapField {
            name: name.into(),
            id,
            key_type: key_type.into(),
            value_type: value_type.into(),
        }));
        self
    }

    pub fn nested(mut self, message: Message) -> Self {
        self.items.push(MessageItem::Message(message));
        self
    }

    pub fn nested_enum(mut self, enumeration: Enum) -> Self {
        self.items.push(MessageItem::Enum(enumeration));
        self
    }
}

impl Field {
    pub fn new(name: impl Into<String>, id: u32, type_name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            id,
            type_name: type_name.into(),
            repeated: false,
            options: Vec::new(),
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(FieldOption {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Value of the boolean option `name`, if set to `true` or `false`.
    pub fn bool_option(&self, name: &str) -> Option<bool> {
        self.options
            .iter()
            .rev()
            .find(|option| option.name == name)
            .and_then(|option| match option.value.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            })
    }
}

impl Enum {
    pub fn new<N, I>(name: impl Into<String>, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, i32)>,
    {
        Enum {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(name, id)| EnumField {
                    name: name.into(),
                    id,
                })
                .collect(),
        }
    }
}

/// Callbacks for walking a [`ProtoFile`].
///
/// Every method has a default: leaf nodes do nothing, and container nodes
/// walk their children. Override a container method and call the matching
/// `walk_*` function to keep descending.
pub trait Visitor {
    fn visit_syntax(&mut self, _syntax: Syntax) {}

    fn visit_package(&mut self, _package: &str) {}

    fn visit_import(&mut self, _import: &Import) {}

    fn visit_message(&mut self, message: &Message) {
        walk_message(self, message);
    }

    fn visit_enum(&mut self, _enumeration: &Enum) {}

    fn visit_field(&mut self, _field: &Field) {}

    fn visit_oneof(&mut self, oneof: &Oneof) {
        walk_oneof(self, oneof);
    }

    fn visit_map_field(&mut self, _field: &MapField) {}
}

pub fn walk_message<V: Visitor + ?Sized>(visitor: &mut V, message: &Message) {
    for item in &message.items {
        match item {
            MessageItem::Field(field) => visitor.visit_field(field),
            MessageItem::Oneof(oneof) => visitor.visit_oneof(oneof),
            MessageItem::MapField(field) => visitor.visit_map_field(field),
            MessageItem::Message(nested) => visitor.visit_message(nested),
            MessageItem::Enum(enumeration) => visitor.visit_enum(enumeration),
        }
    }
}

pub fn walk_oneof<V: Visitor + ?Sized>(visitor: &mut V, oneof: &Oneof) {
    for field in &oneof.fields {
        visitor.visit_field(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect(Vec<String>);

    impl Visitor for Collect {
        fn visit_syntax(&mut self, syntax: Syntax) {
            self.0.push(format!("syntax {syntax}"));
        }

        fn visit_import(&mut self, import: &Import) {
            self.0.push(format!("import {}", import.path));
        }

        fn visit_message(&mut self, message: &Message) {
            self.0.push(format!("message {}", message.name));
            walk_message(self, message);
        }

        fn visit_enum(&mut self, enumeration: &Enum) {
            self.0.push(format!("enum {}", enumeration.name));
        }

        fn visit_field(&mut self, field: &Field) {
            self.0.push(format!("field {}", field.name));
        }

        fn visit_map_field(&mut self, field: &MapField) {
            self.0.push(format!("map {}", field.name));
        }
    }

    #[test]
    fn test_visit_order() {
        let file = ProtoFile::new()
            .syntax(Syntax::Proto3)
            .import("other.proto")
            .message(
                Message::new("Outer")
                    .field(Field::new("a", 1, "int32"))
                    .oneof("choice", [Field::new("b", 2, "string")])
                    .map_field("c", 3, "string", "Outer.Inner")
                    .nested(Message::new("Inner").field(Field::new("d", 1, "bool")))
                    .nested_enum(Enum::new("Kind", [("NONE", 0)])),
            );

        let mut collect = Collect::default();
        file.accept(&mut collect);
        assert_eq!(
            collect.0,
            [
                "syntax proto3",
                "import other.proto",
                "message Outer",
                "field a",
                "field b",
                "map c",
                "message Inner",
                "field d",
                "enum Kind",
            ]
        );
    }

    #[test]
    fn test_bool_option() {
        let field = Field::new("xs", 1, "int32")
            .repeated()
            .option("packed", "true")
            .option("deprecated", "yes");
        assert_eq!(field.bool_option("packed"), Some(true));
        assert_eq!(field.bool_option("deprecated"), None);
        assert_eq!(field.bool_option("missing"), None);
    }
}
