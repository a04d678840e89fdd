use criterion::{Criterion, criterion_group, criterion_main};
use kosh_rag::corpus::chunking::{DEFAULT_MAX_CHUNK_CHARS, Record, build_chunks};
use serde_json::json;
use std::hint::black_box;

fn sample_records(count: usize) -> Vec<Record> {
    (0..count)
        .filter_map(|i| {
            json!({
                "id": format!("ds-{}", i),
                "title": format!("District rainfall statistics {}", i),
                "description": "Monthly rainfall measurements collected across districts. ".repeat(8),
                "about_dataset": "Covers monsoon and post-monsoon seasons with station metadata.",
                "tags": ["agriculture", "climate", "rainfall"],
            })
            .as_object()
            .cloned()
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let records = sample_records(1000);
    c.bench_function("chunking", |b| {
        b.iter(|| {
            build_chunks(
                black_box(&records),
                black_box("datasets.json"),
                black_box(DEFAULT_MAX_CHUNK_CHARS),
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
