use criterion::{black_box, criterion_group, criterion_main, Criterion};
use csv::ReaderBuilder;
use fastcsv::{parse, ColumnType, ParseOptions, ResultSink};

struct DiscardSink {
    columns: Vec<(ColumnType, Vec<u8>)>,
}

impl DiscardSink {
    fn new() -> Self {
        DiscardSink { columns: Vec::new() }
    }
}

impl ResultSink for DiscardSink {
    fn add_header(&mut self, _bytes: &[u8]) {}

    fn add_column(&mut self, col_idx: usize, ty: ColumnType, nrows: usize, width: usize) -> &mut [u8] {
        if self.columns.len() <= col_idx {
            self.columns
                .resize_with(col_idx + 1, || (ColumnType::Int32, Vec::new()));
        }
        self.columns[col_idx] = (ty, vec![0u8; nrows * ty.element_size(width)]);
        &mut self.columns[col_idx].1
    }
}

fn generate_csv(rows: usize, cols: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            if j > 0 {
                out.push(b',');
            }
            out.extend_from_slice(format!("{}", i * 31 + j).as_bytes());
        }
        out.push(b'\n');
    }
    out
}

fn csv_crate_parse(data: &[u8]) -> Vec<Vec<String>> {
    let mut rdr = ReaderBuilder::new().has_headers(false).from_reader(data);
    rdr.records()
        .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
        .collect()
}

fn bench_comparison_simple(c: &mut Criterion) {
    let mut group = c.benchmark_group("comparison_simple_10k");
    let data = generate_csv(10_000, 10);

    group.bench_function("fastcsv_parse", |b| {
        b.iter(|| {
            let mut sink = DiscardSink::new();
            parse(black_box(&data), &ParseOptions::default(), &mut sink).unwrap();
        })
    });

    group.bench_function("csv_crate_parse", |b| {
        b.iter(|| csv_crate_parse(black_box(&data)))
    });

    group.finish();
}

fn bench_comparison_large(c: &mut Criterion) {
    let mut group = c.benchmark_group("comparison_large_200k");
    let data = generate_csv(200_000, 10);

    group.bench_function("fastcsv_parse", |b| {
        b.iter(|| {
            let mut sink = DiscardSink::new();
            parse(black_box(&data), &ParseOptions::default(), &mut sink).unwrap();
        })
    });

    group.bench_function("csv_crate_parse", |b| {
        b.iter(|| csv_crate_parse(black_box(&data)))
    });

    group.finish();
}

fn bench_comparison_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("comparison_wide_1k");
    let data = generate_csv(1_000, 100);

    group.bench_function("fastcsv_parse", |b| {
        b.iter(|| {
            let mut sink = DiscardSink::new();
            parse(black_box(&data), &ParseOptions::default(), &mut sink).unwrap();
        })
    });

    group.bench_function("csv_crate_parse", |b| {
        b.iter(|| csv_crate_parse(black_box(&data)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_comparison_simple,
    bench_comparison_large,
    bench_comparison_wide
);
criterion_main!(benches);
