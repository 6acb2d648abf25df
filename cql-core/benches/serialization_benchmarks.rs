//! Serialization/deserialization throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cql_core::serialization::vint;
use cql_core::{ColumnTypeCode, CqlVector, ProtocolVersion, Serializer, TypeDescriptor, Value};

fn bench_primitive_serialization(c: &mut Criterion) {
    let serializer = Serializer::default();
    let mut group = c.benchmark_group("primitive_serialization");

    for (name, value) in [
        ("int", Value::Int(42)),
        ("bigint", Value::BigInt(123_456_789)),
        ("double", Value::Double(1234.5678)),
        ("text", Value::from("benchmark-value")),
    ] {
        group.bench_with_input(BenchmarkId::new("serialize", name), &value, |b, v| {
            b.iter(|| black_box(serializer.serialize(black_box(v)).unwrap()))
        });
    }

    group.finish();
}

fn bench_primitive_deserialization(c: &mut Criterion) {
    let serializer = Serializer::default();
    let mut group = c.benchmark_group("primitive_deserialization");

    let int_bytes = 42i32.to_be_bytes();
    let text_bytes = b"benchmark-value".to_vec();
    let int = TypeDescriptor::new(ColumnTypeCode::Int);
    let text = TypeDescriptor::new(ColumnTypeCode::Varchar);

    group.bench_function("int", |b| {
        b.iter(|| black_box(serializer.deserialize_value(&int_bytes, &int).unwrap()))
    });
    group.bench_function("text", |b| {
        b.iter(|| black_box(serializer.deserialize_value(&text_bytes, &text).unwrap()))
    });

    group.finish();
}

fn bench_collections(c: &mut Criterion) {
    let serializer = Serializer::default();
    let desc = TypeDescriptor::map(
        TypeDescriptor::new(ColumnTypeCode::Varchar),
        TypeDescriptor::list(TypeDescriptor::new(ColumnTypeCode::Int)),
    );
    let mut group = c.benchmark_group("collections");

    for size in [8usize, 128, 1024] {
        let value = Value::Map(
            (0..size)
                .map(|i| {
                    (
                        Value::Text(format!("key-{}", i)),
                        Value::List((0..4).map(Value::Int).collect()),
                    )
                })
                .collect(),
        );
        let bytes = serializer.serialize(&value).unwrap().unwrap_or_default();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("map_serialize", size), &value, |b, v| {
            b.iter(|| black_box(serializer.serialize(v).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("map_deserialize", size), &bytes, |b, data| {
            b.iter(|| black_box(serializer.deserialize_value(data, &desc).unwrap()))
        });
    }

    group.finish();
}

fn bench_vectors(c: &mut Criterion) {
    let serializer = Serializer::default().clone_with_protocol_version(ProtocolVersion::V5);
    let mut group = c.benchmark_group("vectors");

    for dimension in [128usize, 1536] {
        let desc =
            TypeDescriptor::vector(TypeDescriptor::new(ColumnTypeCode::Float), Some(dimension));
        let value = Value::Vector(CqlVector::from(
            (0..dimension).map(|i| i as f32 * 0.5).collect::<Vec<_>>(),
        ));
        let bytes = serializer
            .serialize_with_type(&value, &desc)
            .unwrap()
            .unwrap_or_default();

        group.throughput(Throughput::Elements(dimension as u64));
        group.bench_with_input(BenchmarkId::new("float_serialize", dimension), &value, |b, v| {
            b.iter(|| black_box(serializer.serialize_with_type(v, &desc).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("float_deserialize", dimension), &bytes, |b, data| {
            b.iter(|| black_box(serializer.deserialize_value(data, &desc).unwrap()))
        });
    }

    group.finish();
}

fn bench_vint(c: &mut Criterion) {
    let mut group = c.benchmark_group("vint");

    for value in [0i64, 300, -70_000, i64::MAX] {
        group.bench_with_input(BenchmarkId::new("encode", value), &value, |b, v| {
            b.iter(|| {
                let mut buf = Vec::with_capacity(vint::MAX_VINT_SIZE);
                vint::write_vint(black_box(*v), &mut buf);
                black_box(buf)
            })
        });

        let mut encoded = Vec::new();
        vint::write_vint(value, &mut encoded);
        group.bench_with_input(BenchmarkId::new("decode", value), &encoded, |b, data| {
            b.iter(|| {
                let mut offset = 0;
                black_box(vint::read_vint(data, &mut offset).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_primitive_serialization,
    bench_primitive_deserialization,
    bench_collections,
    bench_vectors,
    bench_vint,
);

criterion_main!(benches);
