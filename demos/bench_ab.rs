//! A/B benchmark: thread-count scaling vs. a conventional CSV reader.
//!
//!   CSV_CRATE: the `csv` crate's row-at-a-time reader (comparison baseline)
//!   FASTCSV_1 .. FASTCSV_N: this crate's `parse`, at increasing thread counts
//!
//! Usage: cargo run --release --example bench_ab

use std::time::Instant;

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

fn decode_csv_crate(input: &[u8]) -> usize {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input);
    rdr.records().map(|r| r.unwrap().len()).sum()
}

fn decode_fastcsv(input: &[u8], threads: usize) -> usize {
    let options = ParseOptions {
        threads,
        ..ParseOptions::default()
    };
    let mut sink = DiscardSink::new();
    parse(input, &options, &mut sink).unwrap();
    sink.columns.len()
}

fn generate_numeric_table(rows: usize, cols: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(rows * cols * 6);
    for i in 0..rows {
        for j in 0..cols {
            if j > 0 {
                buf.push(b',');
            }
            buf.extend_from_slice(format!("{}", i * 31 + j).as_bytes());
        }
        buf.push(b'\n');
    }
    buf
}

fn generate_mixed_table(rows: usize, cols: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(rows * cols * 12);
    for i in 0..rows {
        for j in 0..cols {
            if j > 0 {
                buf.push(b',');
            }
            if j % 3 == 0 {
                buf.extend_from_slice(format!("row{}_col{}", i, j).as_bytes());
            } else if j % 3 == 1 {
                buf.extend_from_slice(format!("{}.{}", i, j).as_bytes());
            } else {
                buf.extend_from_slice(format!("{}", i * 31 + j).as_bytes());
            }
        }
        buf.push(b'\n');
    }
    buf
}

fn bench_fn(name: &str, input: &[u8], f: impl Fn(&[u8]) -> usize, iters: u32) {
    let _ = f(input); // warm up

    let mut times = Vec::with_capacity(iters as usize);
    for _ in 0..iters {
        let t = Instant::now();
        let result = f(input);
        let elapsed = t.elapsed();
        std::hint::black_box(result);
        times.push(elapsed);
    }

    times.sort();
    let median = times[times.len() / 2];
    let throughput = input.len() as f64 / median.as_secs_f64() / (1024.0 * 1024.0);
    eprintln!("  {name:>10}: median {median:>9.2?}  ({throughput:.0} MB/s)");
}

fn main() {
    let iters = 7;
    let max_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    eprintln!("Available parallelism: {max_threads}");

    eprintln!("\n=== Numeric table, 500K rows x 8 cols ===");
    let numeric = generate_numeric_table(500_000, 8);
    eprintln!(
        "  Input: {} bytes ({:.1} MB)",
        numeric.len(),
        numeric.len() as f64 / (1024.0 * 1024.0)
    );
    bench_fn("csv_crate", &numeric, decode_csv_crate, iters);
    for threads in [1, 2, 4, max_threads] {
        bench_fn(&format!("fastcsv/{threads}"), &numeric, |b| decode_fastcsv(b, threads), iters);
    }

    eprintln!("\n=== Mixed types, 200K rows x 10 cols ===");
    let mixed = generate_mixed_table(200_000, 10);
    eprintln!(
        "  Input: {} bytes ({:.1} MB)",
        mixed.len(),
        mixed.len() as f64 / (1024.0 * 1024.0)
    );
    bench_fn("csv_crate", &mixed, decode_csv_crate, iters);
    for threads in [1, 2, 4, max_threads] {
        bench_fn(&format!("fastcsv/{threads}"), &mixed, |b| decode_fastcsv(b, threads), iters);
    }
}
