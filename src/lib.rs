//! Multi-threaded CSV-to-columnar parse engine with type inference.
//!
//! [`parse`] reads a CSV buffer once and writes each column out in its
//! own native representation (`i32`, `i64`, `f64`, or fixed-width
//! string) rather than handing back a row-major `Vec<Vec<String>>`.
//! Column type is inferred per call: a column stays an integer column
//! until a row forces it wider (a decimal point, an exponent, a NaN/Inf
//! token, or non-numeric text), at which point every value already
//! written for that column is reinterpreted rather than re-read.
//!
//! The buffer is split into roughly-equal byte ranges and scanned by a
//! fixed pool of worker threads (see `coordinate.rs`); a row that
//! happens to straddle a split point is resolved afterward by
//! `fixup.rs` rather than by picking split points that require
//! sequential, quote-aware pre-scanning of the whole buffer first.
//!
//! ```
//! use fastcsv::{parse, ColumnType, ParseOptions, ResultSink};
//!
//! struct Columns(Vec<(ColumnType, Vec<u8>)>);
//!
//! impl ResultSink for Columns {
//!     fn add_header(&mut self, _bytes: &[u8]) {}
//!
//!     fn add_column(&mut self, col_idx: usize, ty: ColumnType, nrows: usize, width: usize) -> &mut [u8] {
//!         if self.0.len() <= col_idx {
//!             self.0.resize_with(col_idx + 1, || (ColumnType::Int32, Vec::new()));
//!         }
//!         self.0[col_idx] = (ty, vec![0u8; nrows * ty.element_size(width)]);
//!         &mut self.0[col_idx].1
//!     }
//! }
//!
//! let mut out = Columns(Vec::new());
//! parse(b"1,2.5\n3,4.5\n", &ParseOptions::default(), &mut out).unwrap();
//! assert_eq!(out.0.len(), 2);
//! ```

mod chunk;
mod coordinate;
mod error;
mod fixup;
mod header;
mod materialize;
mod numeric;
mod reconcile;
mod scan;
mod types;
mod util;

pub use error::FastCsvError;
pub use types::{ColumnType, Flags, ParseOptions};

/// Destination for a parsed CSV buffer's columns and (optional) header.
///
/// Implementations typically own one growable byte buffer per column
/// and hand back a `&mut` view into it sized to `nrows *
/// ty.element_size(width)` bytes; `parse` writes every row's value into
/// that buffer at its row's offset, native-endian.
pub trait ResultSink: Send {
    /// Called once per header cell, in column order, only when
    /// [`ParseOptions::headers`] is set. Called before any
    /// [`ResultSink::add_column`] call.
    fn add_header(&mut self, bytes: &[u8]);

    /// Requests storage for one column's `nrows` values of type `ty`.
    /// `width` is the widest STRING cell observed in this column (ignored
    /// for non-STRING types). Called once per column, after every
    /// column's final type is known.
    fn add_column(&mut self, col_idx: usize, ty: ColumnType, nrows: usize, width: usize) -> &mut [u8];

    /// Lets a caller override a column's inferred type (e.g. forcing a
    /// schema) before storage is requested. The default keeps whatever
    /// type inference produced.
    fn fix_column_type(&mut self, _col_idx: usize, inferred: ColumnType) -> ColumnType {
        inferred
    }
}

/// Parses `buf` as CSV and writes the result into `sink`.
///
/// See [`ParseOptions`] for separator, header, thread count, and
/// missing-value configuration.
pub fn parse(buf: &[u8], options: &ParseOptions, sink: &mut dyn ResultSink) -> Result<(), FastCsvError> {
    if options.separator == b'\n' || options.separator == b'\r' || options.separator == b'"' {
        return Err(FastCsvError::InvalidSeparator(options.separator));
    }
    if options.threads == 0 {
        return Err(FastCsvError::InvalidThreadCount);
    }

    let body = if options.headers {
        let (names, data_start) =
            header::parse_header_row(buf, options.separator, options.flags.excel_quote_escape);
        for name in &names {
            sink.add_header(name);
        }
        &buf[data_start..]
    } else {
        buf
    };

    coordinate::parse_body(body, options, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType as Ty;

    struct Columns {
        headers: Vec<Vec<u8>>,
        columns: Vec<(Ty, Vec<u8>)>,
    }

    impl ResultSink for Columns {
        fn add_header(&mut self, bytes: &[u8]) {
            self.headers.push(bytes.to_vec());
        }

        fn add_column(&mut self, col_idx: usize, ty: Ty, nrows: usize, width: usize) -> &mut [u8] {
            if self.columns.len() <= col_idx {
                self.columns.resize_with(col_idx + 1, || (Ty::Int32, Vec::new()));
            }
            self.columns[col_idx] = (ty, vec![0u8; nrows * ty.element_size(width)]);
            &mut self.columns[col_idx].1
        }
    }

    fn new_sink() -> Columns {
        Columns {
            headers: Vec::new(),
            columns: Vec::new(),
        }
    }

    #[test]
    fn rejects_invalid_separator() {
        let mut sink = new_sink();
        let options = ParseOptions {
            separator: b'"',
            ..ParseOptions::default()
        };
        let err = parse(b"1,2\n", &options, &mut sink).unwrap_err();
        assert!(matches!(err, FastCsvError::InvalidSeparator(b'"')));
    }

    #[test]
    fn rejects_zero_threads() {
        let mut sink = new_sink();
        let options = ParseOptions {
            threads: 0,
            ..ParseOptions::default()
        };
        let err = parse(b"1,2\n", &options, &mut sink).unwrap_err();
        assert!(matches!(err, FastCsvError::InvalidThreadCount));
    }

    #[test]
    fn header_row_is_consumed_before_data() {
        let mut sink = new_sink();
        let options = ParseOptions {
            headers: true,
            threads: 1,
            ..ParseOptions::default()
        };
        parse(b"name,age\nalice,30\nbob,40\n", &options, &mut sink).unwrap();
        assert_eq!(sink.headers, vec![b"name".to_vec(), b"age".to_vec()]);
        assert_eq!(sink.columns[1].0, Ty::Int32);
        assert_eq!(sink.columns[1].1.len(), 2 * 4);
    }

    #[test]
    fn empty_buffer_yields_no_columns() {
        let mut sink = new_sink();
        parse(b"", &ParseOptions::default(), &mut sink).unwrap();
        assert!(sink.columns.is_empty());
    }
}
