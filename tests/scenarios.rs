use fastcsv::{parse, ColumnType, Flags, ParseOptions, ResultSink};

struct Columns {
    headers: Vec<Vec<u8>>,
    columns: Vec<(ColumnType, usize, Vec<u8>)>,
}

impl Columns {
    fn new() -> Self {
        Columns {
            headers: Vec::new(),
            columns: Vec::new(),
        }
    }

    fn ints(&self, col: usize) -> Vec<i64> {
        let (ty, width, bytes) = &self.columns[col];
        match ty {
            ColumnType::Int32 => bytes
                .chunks_exact(4)
                .map(|c| i32::from_ne_bytes(c.try_into().unwrap()) as i64)
                .collect(),
            ColumnType::Int64 => bytes
                .chunks_exact(8)
                .map(|c| i64::from_ne_bytes(c.try_into().unwrap()))
                .collect(),
            other => panic!("column is not integer: {other:?} width={width}"),
        }
    }

    fn doubles(&self, col: usize) -> Vec<f64> {
        let (ty, _, bytes) = &self.columns[col];
        assert_eq!(*ty, ColumnType::Double);
        bytes
            .chunks_exact(8)
            .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
            .collect()
    }

    fn strings(&self, col: usize) -> Vec<Vec<u8>> {
        let (ty, width, bytes) = &self.columns[col];
        assert_eq!(*ty, ColumnType::String);
        bytes
            .chunks_exact(*width)
            .map(|c| {
                let end = c.iter().position(|&b| b == 0).unwrap_or(c.len());
                c[..end].to_vec()
            })
            .collect()
    }
}

impl ResultSink for Columns {
    fn add_header(&mut self, bytes: &[u8]) {
        self.headers.push(bytes.to_vec());
    }

    fn add_column(&mut self, col_idx: usize, ty: ColumnType, nrows: usize, width: usize) -> &mut [u8] {
        if self.columns.len() <= col_idx {
            self.columns
                .resize_with(col_idx + 1, || (ColumnType::Int32, 0, Vec::new()));
        }
        self.columns[col_idx] = (ty, width, vec![0u8; nrows * ty.element_size(width)]);
        &mut self.columns[col_idx].2
    }
}

fn run(data: &[u8], options: &ParseOptions) -> Columns {
    let mut sink = Columns::new();
    parse(data, options, &mut sink).unwrap();
    sink
}

const SWEEP: [usize; 5] = [1, 2, 3, 4, 8];

/// S1: plain integer table with a header row.
#[test]
fn s1_integer_table_with_header() {
    for threads in SWEEP {
        let options = ParseOptions {
            headers: true,
            threads,
            ..ParseOptions::default()
        };
        let out = run(b"a,b,c\n1,2,3\n4,5,6\n", &options);
        assert_eq!(out.headers, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(out.ints(0), vec![1, 4]);
        assert_eq!(out.ints(1), vec![2, 5]);
        assert_eq!(out.ints(2), vec![3, 6]);
    }
}

/// S2: mixed int/double/string columns, no header.
#[test]
fn s2_mixed_types_no_header() {
    for threads in SWEEP {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let out = run(b"1,2.5,hi\n3,4,bye\n", &options);
        assert_eq!(out.ints(0), vec![1, 3]);
        assert_eq!(out.doubles(1), vec![2.5, 4.0]);
        assert_eq!(out.strings(2), vec![b"hi".to_vec(), b"bye".to_vec()]);
    }
}

/// S3: empty cells fall back to the configured missing-integer sentinel.
#[test]
fn s3_empty_cells_use_missing_int_sentinel() {
    for threads in SWEEP {
        let options = ParseOptions {
            headers: true,
            threads,
            missing_int: -1,
            ..ParseOptions::default()
        };
        let out = run(b"x,y\n1,\n,2\n", &options);
        assert_eq!(out.ints(0), vec![1, -1]);
        assert_eq!(out.ints(1), vec![-1, 2]);
    }
}

/// S4: Excel-style doubled-quote escaping inside quoted cells.
#[test]
fn s4_excel_quote_escape() {
    for threads in SWEEP {
        let options = ParseOptions {
            threads,
            flags: Flags {
                excel_quote_escape: true,
            },
            ..ParseOptions::default()
        };
        let out = run(b"\"a,b\",c\n\"\"\"q\"\"\",z\n", &options);
        assert_eq!(out.strings(0), vec![b"a,b".to_vec(), b"\"q\"".to_vec()]);
        assert_eq!(out.strings(1), vec![b"c".to_vec(), b"z".to_vec()]);
    }
}

/// S4b: with the Excel escape convention off (the default), a doubled
/// `""` inside a quoted cell does not collapse to a literal `"`. The
/// first `"` closes the cell and the second is trailing width, not
/// content.
#[test]
fn s4b_doubled_quote_is_inert_without_excel_flag() {
    for threads in SWEEP {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let out = run(b"\"\"\"q\"\"\",z\n", &options);
        assert_eq!(out.strings(0), vec![b"".to_vec()]);
        assert_eq!(out.strings(1), vec![b"z".to_vec()]);
    }
}

/// S5: a quoted cell with an embedded newline must resolve identically
/// regardless of where the chunk split points land.
#[test]
fn s5_quoted_newline_survives_any_split() {
    let data: &[u8] = b"\"line\nbreak\",1\nhello,2\n";
    let single = run(data, &ParseOptions { threads: 1, ..ParseOptions::default() });
    for threads in [2, 3, 4, 8] {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let out = run(data, &options);
        assert_eq!(out.strings(0), single.strings(0));
        assert_eq!(out.ints(1), single.ints(1));
    }
    assert_eq!(single.strings(0), vec![b"line\nbreak".to_vec(), b"hello".to_vec()]);
    assert_eq!(single.ints(1), vec![1, 2]);
}

/// S6: out-of-range exponents clamp to infinity / signed zero rather
/// than erroring.
#[test]
fn s6_extreme_exponents_clamp() {
    for threads in SWEEP {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let out = run(b"1e400,-1e-400\n", &options);
        let col0 = out.doubles(0);
        let col1 = out.doubles(1);
        assert_eq!(col0, vec![f64::INFINITY]);
        assert_eq!(col1[0], 0.0);
        assert!(col1[0].is_sign_negative());
    }
}

/// P4: a column that is INT in one chunk and STRING in another must be
/// reconciled to STRING everywhere, not just where the wide value was seen.
#[test]
fn p4_type_lattice_is_monotone_across_chunks() {
    let mut data = Vec::new();
    for i in 0..2000 {
        data.extend_from_slice(format!("{i}\n").as_bytes());
    }
    data.extend_from_slice(b"notanumber\n");
    for threads in [1, 2, 4, 8] {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let out = run(&data, &options);
        let strings = out.strings(0);
        assert_eq!(strings.len(), 2001);
        assert_eq!(strings[2000], b"notanumber");
        assert_eq!(strings[0], b"0");
    }
}

/// P5: row count equals newline count (the trailing-newline-optional case).
#[test]
fn p5_row_count_matches_newlines() {
    for threads in SWEEP {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let with_trailing = run(b"1,2\n3,4\n5,6\n", &options);
        assert_eq!(with_trailing.ints(0).len(), 3);

        let without_trailing = run(b"1,2\n3,4\n5,6", &options);
        assert_eq!(without_trailing.ints(0).len(), 3);
    }
}

/// P6: a quoted cell straddling a soft chunk boundary matches the
/// single-threaded result, swept across many thread counts and a data
/// size chosen so split points fall inside the quoted run.
#[test]
fn p6_quote_straddle_matches_single_threaded() {
    let mut quoted_field = String::from("\"");
    for i in 0..500 {
        quoted_field.push_str(&format!("line{i}\n"));
    }
    quoted_field.push('"');
    let data = format!("{quoted_field},1\nhello,2\n").into_bytes();

    let single = run(&data, &ParseOptions { threads: 1, ..ParseOptions::default() });
    for threads in [2, 3, 4, 8, 16] {
        let options = ParseOptions {
            threads,
            ..ParseOptions::default()
        };
        let out = run(&data, &options);
        assert_eq!(out.strings(0), single.strings(0));
        assert_eq!(out.ints(1), single.ints(1));
    }
}
