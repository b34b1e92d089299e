//! Cross-format comparison benchmarks.
//!
//! Compares Recon against serde_json on documents carrying the same
//! records. Both sides build a full value tree, so the numbers measure
//! parse + tree construction.
//!
//! Run with: cargo bench --bench compare

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recon_core::value::Value;

/// Generate flat documents with the same content in both formats.
fn generate_flat_documents(count: usize) -> (String, String) {
    let mut recon = String::new();
    let mut json = String::from("[\n");

    for i in 0..count {
        recon.push_str(&format!(
            "{{id: {}, name: \"item-{}\", price: {}.25, tags: {{a, b}}, active: true}}\n",
            i, i, i
        ));
        if i > 0 {
            json.push_str(",\n");
        }
        json.push_str(&format!(
            "{{\"id\": {}, \"name\": \"item-{}\", \"price\": {}.25, \"tags\": [\"a\", \"b\"], \"active\": true}}",
            i, i, i
        ));
    }

    json.push_str("\n]\n");
    (recon, json)
}

fn parse_recon(input: &str) -> usize {
    match recon_core::parse(input) {
        Ok(Value::Record(record)) => record.len(),
        Ok(_) => 1,
        Err(e) => panic!("Recon parse error: {}", e),
    }
}

fn parse_json(input: &str) -> usize {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(serde_json::Value::Array(items)) => items.len(),
        Ok(_) => 1,
        Err(e) => panic!("JSON parse error: {}", e),
    }
}

/// Measures records/second for semantic fairness.
fn bench_parser_comparison(c: &mut Criterion) {
    for count in [50, 200, 500] {
        let (recon_doc, json_doc) = generate_flat_documents(count);

        println!(
            "\n{}rec: Recon={}B/{}rec  JSON={}B/{}rec",
            count,
            recon_doc.len(),
            parse_recon(&recon_doc),
            json_doc.len(),
            parse_json(&json_doc)
        );

        let mut group = c.benchmark_group(format!("compare_{}rec", count));
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("recon", ""), &recon_doc, |b, doc| {
            b.iter(|| parse_recon(black_box(doc)))
        });

        group.bench_with_input(BenchmarkId::new("serde_json", ""), &json_doc, |b, doc| {
            b.iter(|| parse_json(black_box(doc)))
        });

        group.finish();
    }
}

/// Serialization of the same tree.
fn bench_writer_comparison(c: &mut Criterion) {
    let (recon_doc, json_doc) = generate_flat_documents(200);
    let recon_value = recon_core::parse(&recon_doc).unwrap_or_default();
    let json_value: serde_json::Value = serde_json::from_str(&json_doc).unwrap_or_default();

    let mut group = c.benchmark_group("compare_write");
    group.throughput(Throughput::Elements(200));
    group.bench_function("recon", |b| b.iter(|| recon_core::to_string(black_box(&recon_value))));
    group.bench_function("serde_json", |b| b.iter(|| serde_json::to_string(black_box(&json_value))));
    group.finish();
}

criterion_group!(benches, bench_parser_comparison, bench_writer_comparison);
criterion_main!(benches);
