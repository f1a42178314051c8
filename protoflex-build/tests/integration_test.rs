//! Integration tests for protoflex-build.

use std::collections::BTreeMap;

use bytes::Bytes;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use protoflex::{MessageValue, OneofValue, Registry, Value};
use protoflex_build::ast::{Enum, Field, Message, ProtoFile, Syntax};
use protoflex_build::descriptor::{descriptor_registry, DescriptorSource, Label, Type};
use protoflex_build::{Config, Error, MemorySource};

fn shop() -> MemorySource {
    MemorySource::new()
        .with(
            "protos/common/money.proto",
            ProtoFile::new()
                .syntax(Syntax::Proto3)
                .package("common")
                .enumeration(Enum::new("Currency", [("UNSPECIFIED", 0), ("USD", 1), ("EUR", 2)]))
                .message(
                    Message::new("Money")
                        .field(Field::new("currency", 1, "Currency"))
                        .field(Field::new("units", 2, "sint64")),
                ),
        )
        .with(
            "protos/shop/types.proto",
            ProtoFile::new()
                .package("shop")
                .import_public("common/money.proto")
                .message(
                    Message::new("Item")
                        .field(Field::new("sku", 1, "string"))
                        .field(Field::new("price", 2, "common.Money"))
                        .field(Field::new("tags", 3, "string").repeated()),
                ),
        )
        .with(
            "protos/shop/order.proto",
            ProtoFile::new()
                .syntax(Syntax::Proto3)
                .package("shop")
                .import("types.proto")
                .message(
                    Message::new("Order")
                        .field(Field::new("id", 1, "uint64"))
                        .field(Field::new("items", 2, "Item").repeated())
                        .map_field("totals", 3, "string", "common.Money")
                        .oneof(
                            "payment",
                            [Field::new("card", 4, "string"), Field::new("refund_of", 5, "Order")],
                        )
                        .field(Field::new("status", 6, "Status"))
                        .field(Field::new("quantities", 7, "int32").repeated())
                        .field(Field::new("parent", 8, ".shop.Order"))
                        .nested_enum(Enum::new("Status", [("PENDING", 0), ("SHIPPED", 1)])),
                ),
        )
}

fn resolve_shop() -> protoflex_build::Resolution {
    let mut config = Config::new();
    config.include("protos");
    config
        .resolve(&shop(), "protos/shop/order.proto")
        .expect("shop schema resolves")
}

#[test]
fn test_resolved_tables() {
    let resolution = resolve_shop();

    assert_snapshot!(resolution.to_string(), @r#"
    file protos/common/money.proto (proto3, package common)
    enum common.Currency { UNSPECIFIED = 0, USD = 1, EUR = 2 }
    message common.Money
      1 currency: enum common.Currency (VARINT) = UNSPECIFIED
      2 units: sint64 (VARINT) = 0

    file protos/shop/types.proto (proto3, package shop)
    message shop.Item
      1 sku: string (LEN) = ""
      2 price: message common.Money (LEN) = {..}
      3 tags: repeated string (LEN) = []

    file protos/shop/order.proto (proto3, package shop)
    enum shop.Order.Status { PENDING = 0, SHIPPED = 1 }
    message shop.Order
      1 id: uint64 (VARINT) = 0
      2 items: repeated message shop.Item (LEN) = []
      3 totals: map<string, message common.Money> (LEN) = {}
      4 card: string (LEN) = absent [oneof payment]
      5 refund_of: message shop.Order (LEN) = absent [oneof payment] [recursive]
      6 status: enum shop.Order.Status (VARINT) = PENDING
      7 quantities: repeated int32 (LEN, packed) = []
      8 parent: message shop.Order (LEN) = absent [recursive]
    "#);

    assert_eq!(resolution.entry().path, "protos/shop/order.proto");
    assert_eq!(
        resolution
            .files()
            .iter()
            .map(|f| f.path.as_str())
            .collect::<Vec<_>>(),
        [
            "protos/common/money.proto",
            "protos/shop/types.proto",
            "protos/shop/order.proto"
        ]
    );
}

#[test]
fn test_registry_round_trip() {
    let registry = resolve_shop().registry().unwrap();

    let order = MessageValue::new()
        .with("id", Value::U64(1))
        .with("quantities", Value::List(vec![Value::I32(1), Value::I32(2)]))
        .with_oneof("payment", "card", "x");
    let encoded = registry.encode("shop.Order", &order).unwrap();
    assert_eq!(encoded, [0x08, 0x01, 0x22, 0x01, b'x', 0x3A, 0x02, 0x01, 0x02]);

    let decoded = registry.decode("shop.Order", encoded).unwrap();
    assert_eq!(decoded.get("id"), Some(&Value::U64(1)));
    assert_eq!(decoded.get("status"), Some(&Value::Enum(0)));
    assert_eq!(decoded.get("totals"), Some(&Value::Map(BTreeMap::new())));
    assert_eq!(decoded.get("parent"), None);
    assert_eq!(decoded.oneof("payment"), Some(&OneofValue::new("card", "x")));

    let money = registry.default_instance("common.Money").unwrap();
    assert_eq!(
        money,
        MessageValue::new()
            .with("currency", Value::Enum(0))
            .with("units", Value::I64(0))
    );
}

#[test]
fn test_private_imports_are_not_visible() {
    let source = MemorySource::new()
        .with("a.proto", ProtoFile::new().import("b.proto").message(
            Message::new("A").field(Field::new("c", 1, "C")),
        ))
        .with("b.proto", ProtoFile::new().import("c.proto"))
        .with("c.proto", ProtoFile::new().message(Message::new("C")));

    let err = protoflex_build::resolve(&source, "a.proto").unwrap_err();
    assert_eq!(
        err,
        Error::UnresolvedType {
            file: "a.proto".into(),
            message: "A".into(),
            field: "c".into(),
            type_name: "C".into(),
        }
    );
}

#[test]
fn test_resolution_errors() {
    let err = protoflex_build::resolve(&shop(), "protos/shop/order.proto").unwrap_err();
    assert_snapshot!(err.to_string(), @"protos/shop/types.proto: import 'common/money.proto' not found");

    let cyclic = MemorySource::new()
        .with("a.proto", ProtoFile::new().import("b.proto"))
        .with("b.proto", ProtoFile::new().import("c.proto"))
        .with("c.proto", ProtoFile::new().import("a.proto"));
    let err = protoflex_build::resolve(&cyclic, "a.proto").unwrap_err();
    assert_snapshot!(err.to_string(), @"import cycle: a.proto -> b.proto -> c.proto -> a.proto");

    let unsyntaxed = MemorySource::new().with("a.proto", ProtoFile::new());
    let err = Config::new()
        .default_syntax(Syntax::Proto2)
        .resolve(&unsyntaxed, "a.proto")
        .unwrap_err();
    assert_snapshot!(err.to_string(), @"a.proto: unsupported syntax 'proto2'");
}

fn embed(registry: &Registry, name: &str, message: MessageValue) -> Value {
    Value::Bytes(Bytes::from(registry.encode(name, &message).unwrap()))
}

fn field_descriptor(name: &str, number: i32, label: Label, ty: Type) -> MessageValue {
    MessageValue::new()
        .with("name", name)
        .with("number", number)
        .with("label", label as i32)
        .with("type", ty as i32)
}

fn geo_descriptor_set(syntax: Option<&str>) -> Vec<u8> {
    let registry = descriptor_registry().unwrap();

    let entry = MessageValue::new()
        .with("name", "TagsEntry")
        .with(
            "field",
            Value::List(vec![
                embed(&registry, "google.protobuf.FieldDescriptorProto", field_descriptor("key", 1, Label::Optional, Type::String)),
                embed(&registry, "google.protobuf.FieldDescriptorProto", field_descriptor("value", 2, Label::Optional, Type::Int32)),
            ]),
        )
        .with(
            "options",
            embed(&registry, "google.protobuf.MessageOptions", MessageValue::new().with("map_entry", true)),
        );

    let tags = field_descriptor("tags", 3, Label::Repeated, Type::Message).with("type_name", ".geo.Point.TagsEntry");
    let path = field_descriptor("path", 4, Label::Repeated, Type::Sint32).with(
        "options",
        embed(&registry, "google.protobuf.FieldOptions", MessageValue::new().with("packed", false)),
    );

    let point = MessageValue::new()
        .with("name", "Point")
        .with(
            "field",
            Value::List(
                [
                    field_descriptor("x", 1, Label::Optional, Type::Int32),
                    field_descriptor("y", 2, Label::Optional, Type::Int32),
                    tags,
                    path,
                ]
                .into_iter()
                .map(|f| embed(&registry, "google.protobuf.FieldDescriptorProto", f))
                .collect(),
            ),
        )
        .with(
            "nested_type",
            Value::List(vec![embed(&registry, "google.protobuf.DescriptorProto", entry)]),
        );

    let mut file = MessageValue::new()
        .with("name", "geo.proto")
        .with("package", "geo")
        .with(
            "message_type",
            Value::List(vec![embed(&registry, "google.protobuf.DescriptorProto", point)]),
        );
    if let Some(syntax) = syntax {
        file.set("syntax", syntax);
    }

    let set = MessageValue::new().with(
        "file",
        Value::List(vec![embed(&registry, "google.protobuf.FileDescriptorProto", file)]),
    );
    registry.encode("google.protobuf.FileDescriptorSet", &set).unwrap()
}

#[test]
fn test_descriptor_source() {
    let source = DescriptorSource::decode(geo_descriptor_set(Some("proto3"))).unwrap();
    assert_eq!(source.paths().collect::<Vec<_>>(), ["geo.proto"]);

    let resolution = protoflex_build::resolve(&source, "geo.proto").unwrap();
    assert_snapshot!(resolution.to_string(), @r#"
    file geo.proto (proto3, package geo)
    message geo.Point
      1 x: int32 (VARINT) = 0
      2 y: int32 (VARINT) = 0
      3 tags: map<string, int32> (LEN) = {}
      4 path: repeated sint32 (VARINT) = []
    "#);

    let registry = resolution.registry().unwrap();
    let point = MessageValue::new().with("x", 3).with("path", Value::List(vec![Value::I32(-1)]));
    assert_eq!(registry.encode("geo.Point", &point).unwrap(), [0x08, 0x03, 0x20, 0x01]);
}

#[test]
fn test_descriptor_without_syntax_is_proto2() {
    let source = DescriptorSource::decode(geo_descriptor_set(None)).unwrap();
    let err = protoflex_build::resolve(&source, "geo.proto").unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedSyntax {
            file: "geo.proto".into(),
            syntax: "proto2".into(),
        }
    );
}
