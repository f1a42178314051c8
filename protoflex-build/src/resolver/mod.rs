//! Resolution of a loaded schema into codec-bound field tables.
//!
//! Files are resolved in import order: each file's enums first, then its
//! messages. Recursive fields are marked once every file is done, since a
//! cycle can span files.

mod message;
mod recursion;
mod types;

use std::collections::HashMap;
use std::sync::Arc;

use protoflex::schema::DefaultValue;
use protoflex::EnumSchema;
use tracing::debug;

use crate::ast::{self, MessageItem, ProtoFile, Statement, Syntax};
use crate::config::Config;
use crate::context::{FileScope, SchemaContext};
use crate::output::{Resolution, ResolvedFile};
use crate::source::SchemaSource;
use crate::Error;

use message::MessageResolver;
use recursion::{find_recursive_fields, RecursiveField};
use types::TypeResolver;

pub(crate) fn resolve<S>(config: &Config, source: &S, entry: &str) -> Result<Resolution, Error>
where
    S: SchemaSource + ?Sized,
{
    let context = SchemaContext::load(config, source, entry)?;

    let mut enums: HashMap<String, Arc<EnumSchema>> = HashMap::new();
    let mut files = Vec::new();
    for scope in context.files() {
        let syntax = scope.syntax.unwrap_or(config.default_syntax);
        if syntax != Syntax::Proto3 {
            return Err(Error::UnsupportedSyntax {
                file: scope.path.clone(),
                syntax: syntax.to_string(),
            });
        }

        let declared = Declarations::collect(&scope.file);

        let mut file_enums = Vec::with_capacity(declared.enums.len());
        for (local, enumeration) in &declared.enums {
            let schema = resolve_enum(scope, local, enumeration)?;
            enums.insert(schema.name().to_string(), Arc::clone(&schema));
            file_enums.push(schema);
        }

        let resolver = MessageResolver {
            scope,
            syntax,
            types: TypeResolver::new(&context, scope),
            enums: &enums,
        };
        let messages = declared
            .messages
            .iter()
            .map(|(local, message)| resolver.resolve(local, message))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            file = %scope.path,
            messages = messages.len(),
            enums = file_enums.len(),
            "resolved schema file"
        );
        files.push(ResolvedFile {
            path: scope.path.clone(),
            syntax,
            package: scope.package.clone(),
            messages,
            enums: file_enums,
        });
    }

    let recursive = find_recursive_fields(files.iter().flat_map(|file| &file.messages));
    for message in files.iter_mut().flat_map(|file| &mut file.messages) {
        for field in &mut message.fields {
            let key = RecursiveField {
                message: message.name.clone(),
                field: field.name.clone(),
            };
            if recursive.contains(&key) {
                field.recursive = true;
                field.default = DefaultValue::Absent;
            }
        }
    }

    let entry = files
        .iter()
        .position(|file| file.path == context.entry())
        .unwrap_or(files.len().saturating_sub(1));
    let resolution = Resolution { entry, files };
    // Catches symbols defined twice across files.
    resolution.registry()?;
    Ok(resolution)
}

fn resolve_enum(scope: &FileScope, local: &str, enumeration: &ast::Enum) -> Result<Arc<EnumSchema>, Error> {
    let name = scope.qualify(local);
    if !enumeration.values.iter().any(|value| value.id == 0) {
        return Err(Error::MissingEnumZero {
            file: scope.path.clone(),
            name,
        });
    }
    let values = enumeration.values.iter().map(|value| (value.name.as_str(), value.id));
    Ok(Arc::new(EnumSchema::new(name, values)?))
}

/// Messages and enums of one file in declaration order, outer before nested,
/// with their dotted names relative to the package.
struct Declarations<'a> {
    messages: Vec<(String, &'a ast::Message)>,
    enums: Vec<(String, &'a ast::Enum)>,
}

impl<'a> Declarations<'a> {
    fn collect(file: &'a ProtoFile) -> Self {
        let mut declared = Declarations {
            messages: Vec::new(),
            enums: Vec::new(),
        };
        for statement in &file.statements {
            match statement {
                Statement::Message(message) => declared.message("", message),
                Statement::Enum(enumeration) => declared.enums.push((enumeration.name.clone(), enumeration)),
                Statement::Syntax(_) | Statement::Package(_) | Statement::Import(_) => (),
            }
        }
        declared
    }

    fn message(&mut self, prefix: &str, message: &'a ast::Message) {
        let name = dotted(prefix, &message.name);
        self.messages.push((name.clone(), message));
        for item in &message.items {
            match item {
                MessageItem::Message(nested) => self.message(&name, nested),
                MessageItem::Enum(enumeration) => {
                    self.enums.push((dotted(&name, &enumeration.name), enumeration))
                }
                MessageItem::Field(_) | MessageItem::Oneof(_) | MessageItem::MapField(_) => (),
            }
        }
    }
}

fn dotted(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Enum, Field, Message};
    use crate::output::{FieldKind, TypeRef};
    use crate::source::MemorySource;
    use protoflex::codec::{CompositeCodec, FieldCodec, ScalarCodec, ScalarType};
    use protoflex::wire::WireType;
    use protoflex::SchemaError;

    fn resolve_one(file: ProtoFile) -> Result<Resolution, Error> {
        let source = MemorySource::new().with("test.proto", file);
        resolve(&Config::new(), &source, "test.proto")
    }

    #[test]
    fn test_pack_decision() {
        let file = ProtoFile::new().syntax(Syntax::Proto3).message(
            Message::new("M")
                .field(Field::new("ints", 1, "int32").repeated())
                .field(Field::new("unpacked", 2, "int32").repeated().option("packed", "false"))
                .field(Field::new("names", 3, "string").repeated())
                .field(Field::new("forced", 4, "string").repeated().option("packed", "true"))
                .field(Field::new("kinds", 5, "Kind").repeated())
                .nested_enum(Enum::new("Kind", [("NONE", 0)])),
        );
        let resolution = resolve_one(file).unwrap();
        let message = resolution.message("M").unwrap();

        let packed: Vec<_> = message.fields.iter().map(|f| (f.name.as_str(), f.packed)).collect();
        assert_eq!(
            packed,
            [
                ("ints", true),
                ("unpacked", false),
                ("names", false),
                ("forced", false),
                ("kinds", true),
            ]
        );
        assert_eq!(message.field("ints").unwrap().wire_type, WireType::Len);
        assert_eq!(message.field("unpacked").unwrap().wire_type, WireType::Varint);
        assert_eq!(
            message.field("unpacked").unwrap().codec,
            FieldCodec::from(CompositeCodec::repeated(ScalarType::Int32))
        );
    }

    #[test]
    fn test_defaults() {
        let file = ProtoFile::new().package("p").message(
            Message::new("M")
                .field(Field::new("n", 1, "uint64"))
                .field(Field::new("s", 2, "string"))
                .field(Field::new("color", 3, "Color"))
                .field(Field::new("other", 4, "Other"))
                .field(Field::new("xs", 5, "bool").repeated())
                .map_field("m", 6, "string", "Other")
                .oneof("choice", [Field::new("a", 7, "int32"), Field::new("b", 8, "Other")]),
        )
        .message(Message::new("Other"))
        .enumeration(Enum::new("Color", [("RED", 1), ("UNSET", 0)]));

        let resolution = resolve_one(file).unwrap();
        let message = resolution.message("p.M").unwrap();
        let defaults: Vec<_> = message
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.default.clone()))
            .collect();
        assert_eq!(
            defaults,
            [
                ("n", DefaultValue::Scalar(ScalarType::Uint64)),
                ("s", DefaultValue::Scalar(ScalarType::String)),
                ("color", DefaultValue::Enum { name: "UNSET".into() }),
                ("other", DefaultValue::Message("p.Other".into())),
                ("xs", DefaultValue::EmptyList),
                ("m", DefaultValue::EmptyMap),
                ("a", DefaultValue::Absent),
                ("b", DefaultValue::Absent),
            ]
        );
        assert_eq!(message.field("b").unwrap().oneof.as_deref(), Some("choice"));
        assert_eq!(
            message.field("m").unwrap().kind,
            FieldKind::Map {
                key: ScalarType::String,
                value: TypeRef::Message("p.Other".into())
            }
        );
    }

    #[test]
    fn test_enum_codec_is_bound() {
        let file = ProtoFile::new()
            .message(Message::new("M").field(Field::new("k", 1, "Kind")))
            .enumeration(Enum::new("Kind", [("A", 0), ("B", 1)]));
        let resolution = resolve_one(file).unwrap();
        let field = resolution.message("M").unwrap().field("k").unwrap();

        match &field.codec {
            FieldCodec::Scalar(ScalarCodec::Enum(schema)) => {
                assert_eq!(schema.name(), "Kind");
                assert_eq!(schema.name_of(1), Some("B"));
            }
            other => panic!("unexpected codec {other}"),
        }
        assert_eq!(field.wire_type, WireType::Varint);
    }

    #[test]
    fn test_recursive_default_is_absent() {
        let file = ProtoFile::new().message(
            Message::new("Node")
                .field(Field::new("child", 1, "Node"))
                .field(Field::new("children", 2, "Node").repeated()),
        );
        let resolution = resolve_one(file).unwrap();
        let node = resolution.message("Node").unwrap();

        let child = node.field("child").unwrap();
        assert!(child.recursive);
        assert_eq!(child.default, DefaultValue::Absent);

        let children = node.field("children").unwrap();
        assert!(!children.recursive);
        assert_eq!(children.default, DefaultValue::EmptyList);
    }

    #[test]
    fn test_validation_errors() {
        let err = resolve_one(ProtoFile::new().syntax(Syntax::Proto2)).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedSyntax {
                file: "test.proto".into(),
                syntax: "proto2".into()
            }
        );

        let err = resolve_one(ProtoFile::new().message(
            Message::new("M")
                .field(Field::new("a", 1, "int32"))
                .oneof("o", [Field::new("b", 1, "string")]),
        ))
        .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateFieldId {
                file: "test.proto".into(),
                message: "M".into(),
                id: 1
            }
        );

        let err = resolve_one(ProtoFile::new().message(Message::new("M").field(Field::new("a", 0, "int32"))))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFieldId { id: 0, .. }));

        let err = resolve_one(ProtoFile::new().message(Message::new("M").map_field("m", 1, "double", "int32")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.proto: map field M.m cannot be keyed by 'double'"
        );

        let err = resolve_one(ProtoFile::new().enumeration(Enum::new("E", [("ONE", 1)]))).unwrap_err();
        assert_eq!(
            err,
            Error::MissingEnumZero {
                file: "test.proto".into(),
                name: "E".into()
            }
        );

        let err = resolve_one(ProtoFile::new().message(Message::new("M").field(Field::new("x", 1, "Nope"))))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.proto: cannot resolve type 'Nope' of field M.x"
        );

        let err = resolve_one(ProtoFile::new().message(
            Message::new("M").oneof("o", [Field::new("xs", 1, "int32").repeated()]),
        ))
        .unwrap_err();
        assert_eq!(
            err,
            Error::Schema(SchemaError::CompositeOneofMember {
                message: "M".into(),
                field: "xs".into()
            })
        );

        let err = resolve_one(ProtoFile::new().message(Message::new("M")).message(Message::new("M"))).unwrap_err();
        assert_eq!(err, Error::Schema(SchemaError::DuplicateSymbol { name: "M".into() }));
    }

    #[test]
    fn test_declarations_order() {
        let file = ProtoFile::new()
            .message(
                Message::new("A")
                    .nested(Message::new("B").nested_enum(Enum::new("E", [("Z", 0)])))
                    .nested(Message::new("C")),
            )
            .enumeration(Enum::new("Top", [("Z", 0)]));
        let declared = Declarations::collect(&file);
        let messages: Vec<_> = declared.messages.iter().map(|(n, _)| n.as_str()).collect();
        let enums: Vec<_> = declared.enums.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(messages, ["A", "A.B", "A.C"]);
        assert_eq!(enums, ["A.B.E", "Top"]);
    }
}
