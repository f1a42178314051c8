//! Encode/decode throughput for a small address-book style message.

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use protoflex::codec::{CompositeCodec, ScalarCodec, ScalarType};
use protoflex::{EnumSchema, MessageSchema, MessageValue, Registry, Value};

fn registry() -> Registry {
    let mut registry = Registry::new();
    let phone_type = registry
        .insert_enum(
            EnumSchema::new("PhoneType", [("MOBILE", 0), ("HOME", 1), ("WORK", 2)])
                .expect("valid enum"),
        )
        .expect("unique enum");
    registry
        .insert_message(
            MessageSchema::builder("PhoneNumber")
                .field("number", 1, ScalarType::String)
                .field("type", 2, ScalarCodec::Enum(phone_type))
                .build()
                .expect("valid schema"),
        )
        .expect("unique message");
    registry
        .insert_message(
            MessageSchema::builder("Person")
                .field("name", 1, ScalarType::String)
                .field("id", 2, ScalarType::Int32)
                .field("email", 3, ScalarType::String)
                .field(
                    "phones",
                    4,
                    CompositeCodec::repeated(ScalarCodec::Message("PhoneNumber".into())),
                )
                .field("scores", 5, CompositeCodec::packed(ScalarType::Sint64).expect("packable"))
                .build()
                .expect("valid schema"),
        )
        .expect("unique message");
    registry
}

fn person(num_phones: usize) -> MessageValue {
    let phones = (0..num_phones)
        .map(|i| {
            Value::Message(
                MessageValue::new()
                    .with("number", format!("555-{i:04}"))
                    .with("type", Value::Enum((i % 3) as i32)),
            )
        })
        .collect::<Vec<_>>();
    let scores = (0..num_phones as i64)
        .map(|i| Value::I64(i * -1_000))
        .collect::<Vec<_>>();

    MessageValue::new()
        .with("name", "John Doe")
        .with("id", 12345i32)
        .with("email", "john.doe@example.com")
        .with("phones", phones)
        .with("scores", scores)
}

fn encode_benchmark(c: &mut Criterion) {
    let registry = registry();

    let mut group = c.benchmark_group("encode");
    for num_phones in [0, 1, 5, 10, 50] {
        let message = person(num_phones);
        let encoded_size = registry.encode("Person", &message).expect("encodes").len();
        group.throughput(Throughput::Bytes(encoded_size as u64));

        group.bench_with_input(
            BenchmarkId::new("binary", num_phones),
            &message,
            |b, message| b.iter(|| registry.encode("Person", std::hint::black_box(message))),
        );
        group.bench_with_input(
            BenchmarkId::new("json", num_phones),
            &message,
            |b, message| b.iter(|| registry.encode_json("Person", std::hint::black_box(message))),
        );
    }
    group.finish();
}

fn decode_benchmark(c: &mut Criterion) {
    let registry = registry();

    let mut group = c.benchmark_group("decode");
    for num_phones in [0, 1, 5, 10, 50] {
        let message = person(num_phones);
        let encoded = Bytes::from(registry.encode("Person", &message).expect("encodes"));
        let json = registry.encode_json("Person", &message).expect("encodes");
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("binary", num_phones),
            &encoded,
            |b, encoded| b.iter(|| registry.decode("Person", std::hint::black_box(encoded.clone()))),
        );
        group.bench_with_input(BenchmarkId::new("json", num_phones), &json, |b, json| {
            b.iter(|| registry.decode_json("Person", std::hint::black_box(json)))
        });
    }
    group.finish();
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
