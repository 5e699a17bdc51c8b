//! Benchmarks for wrapping documents and mutating their containers
//!
//! Run with: cargo bench --bench wrap_bench

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use docshape::{
    DateTimeProperty, DecimalProperty, DictProperty, IntegerProperty, JsonArray, ListProperty,
    PropertyOptionsExt, Schema, StringProperty, ValueKind,
};
use serde_json::{Value as JsonValue, json};

fn line_schema() -> Arc<Schema> {
    Schema::builder("Line")
        .property("sku", StringProperty::new().required())
        .property("quantity", IntegerProperty::new())
        .property("price", DecimalProperty::new())
        .build()
        .expect("line schema")
}

fn order_schema(line: &Arc<Schema>) -> Arc<Schema> {
    Schema::builder("Order")
        .property("id", StringProperty::new().required())
        .property("placed_at", DateTimeProperty::new())
        .property("lines", ListProperty::of(line))
        .property("tags", DictProperty::of(ValueKind::String))
        .build()
        .expect("order schema")
}

/// Generate an order document with `lines` line items
fn generate_order(lines: usize) -> JsonValue {
    let items: Vec<JsonValue> = (0..lines)
        .map(|i| {
            json!({
                "sku": format!("SKU-{:05}", i),
                "quantity": (i % 7) + 1,
                "price": format!("{}.{:02}", 10 + i % 90, i % 100),
            })
        })
        .collect();
    json!({
        "id": "order-1",
        "placed_at": "2024-01-15T10:30:00Z",
        "lines": items,
        "tags": {"channel": "web", "region": "eu"},
        "note": "left at the door",
    })
}

/// Benchmark wrapping raw JSON into a typed document
fn bench_wrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap");
    let schema = order_schema(&line_schema());

    for count in [10, 100, 1000].iter() {
        let raw = generate_order(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("order", count), &raw, |b, raw| {
            b.iter(|| black_box(schema.wrap(raw)));
        });
    }

    group.finish();
}

/// Benchmark validating and exporting the canonical form
fn bench_to_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_json");
    let schema = order_schema(&line_schema());

    for count in [10, 100, 1000].iter() {
        let doc = schema.wrap(&generate_order(*count)).expect("order");
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("order", count), &doc, |b, doc| {
            b.iter(|| black_box(doc.to_json()));
        });
    }

    group.finish();
}

/// Benchmark container appends, which keep both views in step
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    group.bench_function("integers_1000", |b| {
        b.iter(|| {
            let mut array = JsonArray::new(Arc::new(IntegerProperty::new().required()));
            for i in 0..1000i64 {
                let _ = array.append(i);
            }
            black_box(array)
        });
    });

    group.bench_function("document_list_100", |b| {
        let line = line_schema();
        let schema = order_schema(&line);
        b.iter(|| {
            let mut doc = schema.wrap(&generate_order(0)).expect("order");
            {
                let mut lines = doc.attr_mut("lines").expect("lines");
                if let Some(lines) = lines.as_array_mut() {
                    for i in 0..100 {
                        let raw = json!({"sku": format!("SKU-{}", i), "quantity": 1});
                        if let Ok(item) = line.wrap(&raw) {
                            let _ = lines.append(item);
                        }
                    }
                }
            }
            black_box(doc)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_wrap, bench_to_json, bench_append);
criterion_main!(benches);
