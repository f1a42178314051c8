//! End-to-end behavior of messages through a [`Registry`].

use std::collections::BTreeMap;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use protoflex::codec::{CompositeCodec, ScalarCodec, ScalarType, RECURSION_LIMIT};
use protoflex::leb128::LebCodec;
use protoflex::{
    DecodeError, EnumSchema, MapKey, MessageSchema, MessageValue, OneofValue, Registry, Value,
};
use serde_json::json;

/// Equivalent to:
/// ```protobuf
/// enum Kind { UNKNOWN = 0; SMALL = 1; LARGE = 2; }
///
/// message Scalars {
///     int32 i32 = 1;    int64 i64 = 2;     uint32 u32 = 3;    uint64 u64 = 4;
///     sint32 s32 = 5;   sint64 s64 = 6;    bool b = 7;        fixed32 f32 = 8;
///     sfixed32 sf32 = 9; float fl = 10;    fixed64 f64 = 11;  sfixed64 sf64 = 12;
///     double d = 13;    string s = 14;     bytes by = 15;
/// }
///
/// message Envelope {
///     map<int32, string> m = 1;
///     repeated int32 r = 2 [packed = false];
///     repeated int32 p = 3;
///     oneof body {
///         string text = 4;
///         uint64 count = 5;
///         Scalars inner = 6;
///     }
///     Kind kind = 7;
/// }
/// ```
fn registry() -> Registry {
    let mut registry = Registry::new();
    let kind = registry
        .insert_enum(EnumSchema::new("Kind", [("UNKNOWN", 0), ("SMALL", 1), ("LARGE", 2)]).unwrap())
        .unwrap();

    let scalars = ScalarType::ALL
        .into_iter()
        .enumerate()
        .fold(MessageSchema::builder("Scalars"), |builder, (idx, ty)| {
            builder.field(scalar_field(ty), idx as u32 + 1, ty)
        })
        .build()
        .unwrap();
    registry.insert_message(scalars).unwrap();

    let envelope = MessageSchema::builder("Envelope")
        .field(
            "m",
            1,
            CompositeCodec::map(ScalarType::Int32, ScalarType::String).unwrap(),
        )
        .field("r", 2, CompositeCodec::repeated(ScalarType::Int32))
        .field("p", 3, CompositeCodec::packed(ScalarType::Int32).unwrap())
        .oneof(
            "body",
            [
                ("text", 4, ScalarCodec::Primitive(ScalarType::String)),
                ("count", 5, ScalarCodec::Primitive(ScalarType::Uint64)),
                ("inner", 6, ScalarCodec::Message("Scalars".into())),
            ],
        )
        .field("kind", 7, ScalarCodec::Enum(kind))
        .build()
        .unwrap();
    registry.insert_message(envelope).unwrap();

    registry
}

fn scalar_field(ty: ScalarType) -> &'static str {
    match ty {
        ScalarType::Int32 => "i32",
        ScalarType::Int64 => "i64",
        ScalarType::Uint32 => "u32",
        ScalarType::Uint64 => "u64",
        ScalarType::Sint32 => "s32",
        ScalarType::Sint64 => "s64",
        ScalarType::Bool => "b",
        ScalarType::Fixed32 => "f32",
        ScalarType::Sfixed32 => "sf32",
        ScalarType::Float => "fl",
        ScalarType::Fixed64 => "f64",
        ScalarType::Sfixed64 => "sf64",
        ScalarType::Double => "d",
        ScalarType::String => "s",
        ScalarType::Bytes => "by",
    }
}

fn scalars(pick: impl Fn(ScalarType) -> Value) -> MessageValue {
    ScalarType::ALL
        .into_iter()
        .fold(MessageValue::new(), |message, ty| {
            message.with(scalar_field(ty), pick(ty))
        })
}

fn minimums(ty: ScalarType) -> Value {
    match ty.native_kind() {
        "i32" => Value::I32(i32::MIN),
        "i64" => Value::I64(i64::MIN),
        "u32" => Value::U32(u32::MIN),
        "u64" => Value::U64(u64::MIN),
        "bool" => Value::Bool(false),
        "f32" => Value::F32(f32::MIN),
        "f64" => Value::F64(f64::MIN),
        "string" => Value::from(""),
        _ => Value::Bytes(Bytes::new()),
    }
}

fn maximums(ty: ScalarType) -> Value {
    match ty.native_kind() {
        "i32" => Value::I32(i32::MAX),
        "i64" => Value::I64(i64::MAX),
        "u32" => Value::U32(u32::MAX),
        "u64" => Value::U64(u64::MAX),
        "bool" => Value::Bool(true),
        "f32" => Value::F32(f32::MAX),
        "f64" => Value::F64(f64::MAX),
        "string" => Value::from("héllo wörld"),
        _ => Value::Bytes(Bytes::from_static(&[0, 0xFF, 0xFB, 0x3E])),
    }
}

fn minus_one(ty: ScalarType) -> Value {
    match ty.native_kind() {
        "i32" => Value::I32(-1),
        "i64" => Value::I64(-1),
        "f32" => Value::F32(-1.0),
        "f64" => Value::F64(-1.0),
        _ => maximums(ty),
    }
}

#[test]
fn test_scalar_boundaries_roundtrip() {
    let registry = registry();
    for message in [
        scalars(minimums),
        scalars(maximums),
        scalars(minus_one),
        scalars(ScalarType::default_value),
    ] {
        let bytes = registry.encode("Scalars", &message).unwrap();
        assert_eq!(registry.decode("Scalars", bytes).unwrap(), message);

        let json = registry.encode_json("Scalars", &message).unwrap();
        assert_eq!(registry.decode_json("Scalars", &json).unwrap(), message);
    }
}

#[test]
fn test_scalar_json_shape() {
    let registry = registry();
    let json = registry.encode_json("Scalars", &scalars(maximums)).unwrap();
    assert_eq!(json["i32"], json!(2147483647));
    assert_eq!(json["i64"], json!("9223372036854775807"));
    assert_eq!(json["u64"], json!("18446744073709551615"));
    assert_eq!(json["b"], json!(true));
    assert_eq!(json["by"], json!("AP/7Pg=="));
}

#[test]
fn test_cross_representation_equivalence() {
    let registry = registry();
    let message = MessageValue::new()
        .with(
            "m",
            BTreeMap::from([
                (MapKey::I32(-2147483647), Value::from("foo")),
                (MapKey::I32(3), Value::from("bar")),
            ]),
        )
        .with("r", vec![Value::I32(-1), Value::I32(2)])
        .with("p", vec![Value::I32(300)])
        .with("kind", Value::Enum(2))
        .with_oneof("body", "inner", scalars(minus_one));

    let from_binary = registry
        .decode("Envelope", registry.encode("Envelope", &message).unwrap())
        .unwrap();
    let from_json = registry
        .decode_json("Envelope", &registry.encode_json("Envelope", &message).unwrap())
        .unwrap();

    assert_eq!(from_binary, from_json);
    assert_eq!(
        registry.encode("Envelope", &from_binary).unwrap(),
        registry.encode("Envelope", &from_json).unwrap()
    );
    assert_eq!(
        registry.encode_json("Envelope", &from_binary).unwrap(),
        registry.encode_json("Envelope", &from_json).unwrap()
    );
    assert_eq!(
        registry.encode_json("Envelope", &from_json).unwrap()["kind"],
        json!("LARGE")
    );
}

#[test]
fn test_map_entry_bytes() {
    let registry = registry();
    let message = MessageValue::new().with(
        "m",
        BTreeMap::from([(MapKey::I32(-2147483647), Value::from("foo"))]),
    );

    let bytes = registry.encode("Envelope", &message).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x0A, 0x10, 0x08, 0x81, 0x80, 0x80, 0x80, 0xF8, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x12,
            0x03, 0x66, 0x6F, 0x6F,
        ]
    );
}

#[test]
fn test_map_last_key_wins() {
    let registry = registry();
    let bytes: &[u8] = &[
        0x0A, 0x05, 0x08, 0x01, 0x12, 0x01, b'a', //
        0x0A, 0x05, 0x08, 0x01, 0x12, 0x01, b'b',
    ];
    let message = registry.decode("Envelope", Bytes::from_static(bytes)).unwrap();
    assert_eq!(
        message.get("m"),
        Some(&Value::Map(BTreeMap::from([(MapKey::I32(1), Value::from("b"))])))
    );
}

#[test]
fn test_packed_and_repeated_decode_alike() {
    let registry = registry();
    let items = vec![Value::I32(1), Value::I32(150), Value::I32(-1)];

    let repeated = registry
        .encode("Envelope", &MessageValue::new().with("r", items.clone()))
        .unwrap();
    let packed = registry
        .encode("Envelope", &MessageValue::new().with("p", items.clone()))
        .unwrap();
    assert_ne!(repeated, packed);

    // Re-tag the packed run as field 2 and the unpacked entries as field 3:
    // each field accepts the other's encoding.
    let mut swapped = packed.clone();
    swapped[0] = 0x12;
    let as_repeated = registry.decode("Envelope", swapped).unwrap();
    assert_eq!(as_repeated.get("r"), Some(&Value::List(items.clone())));

    let swapped: Vec<u8> = repeated
        .iter()
        .map(|byte| if *byte == 0x10 { 0x18 } else { *byte })
        .collect();
    let as_packed = registry.decode("Envelope", swapped).unwrap();
    assert_eq!(as_packed.get("p"), Some(&Value::List(items)));
}

#[test]
fn test_oneof_assignment() {
    let registry = registry();
    let mut message = MessageValue::new().with_oneof("body", "text", "a");
    message.set_oneof("body", "count", 9u64);

    assert_eq!(message.get("text"), None);
    assert_eq!(message.get("count"), Some(&Value::U64(9)));

    let bytes = registry.encode("Envelope", &message).unwrap();
    assert_eq!(bytes, vec![0x28, 0x09]);

    let decoded = registry.decode("Envelope", bytes).unwrap();
    assert_eq!(decoded.oneof("body"), Some(&OneofValue::new("count", 9u64)));
    assert_eq!(
        registry.encode_json("Envelope", &decoded).unwrap()["count"],
        json!("9")
    );
}

#[test]
fn test_decoded_instances_are_full() {
    let registry = registry();
    let message = registry.decode("Envelope", Bytes::new()).unwrap();

    assert_eq!(message, registry.default_instance("Envelope").unwrap());
    assert_eq!(message.get("m"), Some(&Value::Map(BTreeMap::new())));
    assert_eq!(message.get("r"), Some(&Value::List(Vec::new())));
    assert_eq!(message.get("kind"), Some(&Value::Enum(0)));
    assert_eq!(message.oneof("body"), None);

    // Empty sequences write nothing, zero scalars are written as is.
    assert_eq!(registry.encode("Envelope", &message).unwrap(), vec![0x38, 0x00]);
}

#[test]
fn test_unknown_data_ignored() {
    let registry = registry();

    let bytes: &[u8] = &[0xF8, 0x01, 0x2A, 0x38, 0x01, 0x82, 0x02, 0x01, 0xFF];
    let message = registry.decode("Envelope", Bytes::from_static(bytes)).unwrap();
    assert_eq!(message.get("kind"), Some(&Value::Enum(1)));

    let message = registry
        .decode_json("Envelope", &json!({"kind": "SMALL", "nickname": "x"}))
        .unwrap();
    assert_eq!(message.get("kind"), Some(&Value::Enum(1)));

    let message = MessageValue::new().with("nickname", "x");
    assert_eq!(registry.encode("Envelope", &message).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_malformed_input() {
    let registry = registry();

    // wire type 3 (group start)
    assert!(registry.decode("Envelope", Bytes::from_static(&[0x0B])).is_err());
    // truncated length-delimited payload
    assert!(registry.decode("Envelope", Bytes::from_static(&[0x22, 0x05, b'a'])).is_err());
    // unknown message
    assert!(registry.decode("Nope", Bytes::new()).is_err());

    let err = registry
        .decode_json("Envelope", &json!({"inner": {"i32": "many"}}))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'inner': field 'i32': malformed json: expected integer"
    );
}

#[test]
fn test_infinite_floats_json_roundtrip() {
    let registry = registry();
    for (f, d) in [(f32::INFINITY, f64::NEG_INFINITY), (f32::NEG_INFINITY, f64::INFINITY)] {
        let message = MessageValue::new().with("fl", f).with("d", d);
        let json = registry.encode_json("Scalars", &message).unwrap();
        let decoded = registry.decode_json("Scalars", &json).unwrap();
        assert_eq!(decoded.get("fl"), Some(&Value::F32(f)));
        assert_eq!(decoded.get("d"), Some(&Value::F64(d)));
    }
}

#[test]
fn test_packed_strings() {
    let mut registry = Registry::new();
    let schema = MessageSchema::builder("Names")
        .field("s", 1, CompositeCodec::packed(ScalarType::String).unwrap())
        .build()
        .unwrap();
    registry.insert_message(schema).unwrap();

    let bytes: &[u8] = &[0x0A, 0x03, 0x02, b'a', b'b'];
    let message = registry.decode("Names", Bytes::from_static(bytes)).unwrap();
    assert_eq!(message.get("s"), Some(&Value::List(vec![Value::from("ab")])));
    assert_eq!(registry.encode("Names", &message).unwrap(), bytes);
}

/// `message Node { Node child = 1; }` nested `levels` times below the root.
fn nested_nodes(levels: usize) -> Bytes {
    let mut buf = Vec::new();
    for _ in 0..levels {
        let mut outer = vec![0x0A];
        (buf.len() as u64).encode_leb128(&mut outer);
        outer.extend_from_slice(&buf);
        buf = outer;
    }
    Bytes::from(buf)
}

fn root_cause(mut err: &DecodeError) -> &DecodeError {
    while let DecodeError::Field { source, .. } = err {
        err = source;
    }
    err
}

#[test]
fn test_nesting_depth_is_bounded() {
    let mut registry = Registry::new();
    let node = MessageSchema::builder("Node")
        .field("child", 1, ScalarCodec::Message("Node".into()))
        .build()
        .unwrap();
    registry.insert_message(node).unwrap();

    let limit = RECURSION_LIMIT as usize;
    let mut message = registry.decode("Node", nested_nodes(limit)).unwrap();
    for _ in 0..limit {
        message = match message.get("child") {
            Some(Value::Message(child)) => child.clone(),
            other => panic!("expected a child, found {other:?}"),
        };
    }
    assert_eq!(message.get("child"), None);

    for levels in [limit + 1, 10_000] {
        let err = registry.decode("Node", nested_nodes(levels)).unwrap_err();
        assert_eq!(
            root_cause(&err),
            &DecodeError::RecursionLimit {
                limit: RECURSION_LIMIT
            }
        );
    }
}
