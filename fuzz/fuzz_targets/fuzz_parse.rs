#![no_main]

use fastcsv::{parse, ColumnType, ParseOptions, ResultSink};
use libfuzzer_sys::fuzz_target;

struct DiscardSink;

impl ResultSink for DiscardSink {
    fn add_header(&mut self, _bytes: &[u8]) {}

    fn add_column(&mut self, _col_idx: usize, ty: ColumnType, nrows: usize, width: usize) -> &mut [u8] {
        let len = nrows * ty.element_size(width);
        Box::leak(vec![0u8; len].into_boxed_slice())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut sink = DiscardSink;
    for threads in [1usize, 2] {
        for headers in [false, true] {
            let options = ParseOptions {
                threads,
                headers,
                ..ParseOptions::default()
            };
            let _ = parse(data, &options, &mut sink);
        }
    }
});
