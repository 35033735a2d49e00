#[macro_use]
extern crate criterion;

#[path = "../tests/fixtures.rs"]
mod fixtures;

use arsc_decoder::json_output::table_to_json;
use arsc_decoder::ArscParser;
use criterion::Criterion;

fn decode_table(buffer: &[u8]) {
    let table = ArscParser::from_buffer(buffer.to_vec())
        .decode_table()
        .unwrap();
    assert_eq!(table.package(0x7f).map(|p| p.spec_count()), Some(11));
}

fn criterion_benchmark(c: &mut Criterion) {
    let sample = fixtures::sample_table();

    c.bench_function("decode sample table", |b| b.iter(|| decode_table(&sample)));

    let table = ArscParser::from_buffer(sample.clone())
        .decode_table()
        .unwrap();
    c.bench_function("summarize sample table", |b| {
        b.iter(|| table_to_json(&table, true))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
