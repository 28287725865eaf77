//! C2: stage-1 per-chunk scanner.
//!
//! Grounded in `original_source/src/fastcsv.c`'s `parse_stage1` (lines
//! 491-718). Each worker thread scans one contiguous byte range,
//! classifying every cell into its column's current running type and
//! recording, per record, a cell count followed by `k` running
//! end-offsets relative to the record's start byte (DESIGN.md Open
//! Question 3).
//!
//! A thread's `start`/`soft_end` range is picked without quote-aware
//! knowledge of the rest of the buffer (see `coordinate.rs`), so the
//! newline this scanner treats as the record boundary at `soft_end` may
//! in fact sit inside a quoted cell that straddles into the next
//! chunk. `found_end` records where that ambiguous boundary row began;
//! `fixup.rs` (C3) re-derives the authoritative version of that row
//! later with full context.

use crate::chunk::Chunk;
use crate::numeric::{decode_numeric_cell, DecodeOutcome};
use crate::types::{ColumnType, Flags};
use crate::util::scan_string_extent;

/// Scans the byte range `[start, soft_end)` of `data`.
///
/// `chunk_idx` is only used to label the resulting [`Chunk`]; every
/// chunk (including chunk 0) is scanned starting exactly at `start`
/// on the assumption that it is a record boundary, which `coordinate.rs`
/// guarantees by picking split points outside any quoted run.
///
/// When `extend_past_soft_end` is set, the scan treats `soft_end` as
/// merely a hint and keeps going to the next `\n` past it so the record
/// straddling it is finished rather than cut short; `fixup.rs`'s
/// boundary re-scan needs that to grow its window across a multi-line
/// quoted cell. Ordinary worker chunks pass `false`: `soft_end` is
/// already a safe boundary, so stopping exactly there is correct and
/// avoids silently absorbing an extra row that `coordinate.rs`'s
/// stitching didn't ask for.
pub fn scan_chunk<'a>(
    data: &'a [u8],
    chunk_idx: usize,
    start: usize,
    soft_end: usize,
    sep: u8,
    flags: Flags,
    missing_int: i64,
    missing_float: f64,
    extend_past_soft_end: bool,
) -> Chunk<'a> {
    let buf_end = if soft_end >= data.len() {
        data.len()
    } else if extend_past_soft_end {
        match memchr::memchr(b'\n', &data[soft_end..]) {
            Some(rel) => soft_end + rel + 1,
            None => data.len(),
        }
    } else {
        soft_end
    };

    let mut chunk = Chunk {
        chunk_idx,
        data,
        start,
        soft_end,
        buf_end,
        found_end: start,
        columns: Vec::new(),
        offsets: crate::chunk::Arena::new(),
        row_starts: crate::chunk::Arena::new(),
        nrows: 0,
        truncated: false,
    };

    let mut p = start;
    let mut row_idx = 0usize;

    while p < buf_end {
        let row_start = p;
        chunk.found_end = row_start;
        chunk.row_starts.push(row_start as u32);
        let count_slot = chunk.offsets.push(0);
        let mut col_idx = 0usize;

        loop {
            let cell_start = p;
            let column_ty = chunk.column_mut(col_idx, row_idx).ty;

            let cell_end = if column_ty == ColumnType::String {
                let end = scan_string_extent(data, cell_start, buf_end, sep, flags.excel_quote_escape);
                if end == buf_end && buf_end < data.len() && data[cell_start] == b'"' {
                    chunk.truncated = true;
                }
                let width = end - cell_start;
                chunk.column_mut(col_idx, row_idx).note_width(width);
                end
            } else {
                let end = match memchr::memchr2(sep, b'\n', &data[cell_start..buf_end]) {
                    Some(rel) => cell_start + rel,
                    None => buf_end,
                };
                let cell = &data[cell_start..end];
                if cell.is_empty() {
                    chunk
                        .column_mut(col_idx, row_idx)
                        .push_missing(missing_int, missing_float);
                    end
                } else {
                    match decode_numeric_cell(cell) {
                        DecodeOutcome::Int(v) => {
                            chunk.column_mut(col_idx, row_idx).push_int(v);
                            end
                        }
                        DecodeOutcome::Double(v) => {
                            chunk.column_mut(col_idx, row_idx).push_double(v);
                            end
                        }
                        DecodeOutcome::Invalid => {
                            chunk.column_mut(col_idx, row_idx).promote_to_string();
                            let reend =
                                scan_string_extent(data, cell_start, buf_end, sep, flags.excel_quote_escape);
                            if reend == buf_end && buf_end < data.len() && data[cell_start] == b'"'
                            {
                                chunk.truncated = true;
                            }
                            let width = reend - cell_start;
                            chunk.column_mut(col_idx, row_idx).note_width(width);
                            reend
                        }
                    }
                }
            };

            chunk
                .offsets
                .push((cell_end - row_start) as u32);
            p = cell_end;
            col_idx += 1;

            if p >= buf_end {
                break;
            }
            if data[p] == sep {
                p += 1;
                continue;
            }
            debug_assert_eq!(data[p], b'\n');
            p += 1;
            break;
        }

        pad_ragged_right(&mut chunk.columns, col_idx, missing_int, missing_float);
        chunk.offsets.set(count_slot, col_idx as u32);
        row_idx += 1;
    }

    chunk.nrows = row_idx;
    chunk
}

/// Pads every already-existing column beyond `from` with a missing-value
/// sentinel for the row just finished, so every column's value arena
/// stays aligned one element per row regardless of which row first
/// introduced it.
fn pad_ragged_right(
    columns: &mut [crate::chunk::ColumnDescriptor],
    from: usize,
    missing_int: i64,
    missing_float: f64,
) {
    for column in columns.iter_mut().skip(from) {
        column.push_missing(missing_int, missing_float);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Flags;

    fn scan(input: &[u8]) -> Chunk<'_> {
        scan_chunk(input, 0, 0, input.len(), b',', Flags::default(), -1, f64::NAN, true)
    }

    #[test]
    fn single_row_all_int() {
        let chunk = scan(b"1,2,3\n");
        assert_eq!(chunk.nrows, 1);
        assert_eq!(chunk.columns.len(), 3);
        for c in &chunk.columns {
            assert_eq!(c.ty, ColumnType::Int32);
            assert_eq!(c.values.len(), 1);
        }
    }

    #[test]
    fn mixed_types_promote_column() {
        let chunk = scan(b"1,a\n2,b\n3.5,c\n");
        assert_eq!(chunk.nrows, 3);
        assert_eq!(chunk.columns[0].ty, ColumnType::Double);
        assert_eq!(chunk.columns[1].ty, ColumnType::String);
    }

    #[test]
    fn ragged_row_pads_missing() {
        let chunk = scan(b"1,2,3\n4\n");
        assert_eq!(chunk.nrows, 2);
        assert_eq!(chunk.columns.len(), 3);
        assert_eq!(chunk.columns[1].values.len(), 2);
        assert_eq!(i64::from_ne_bytes(chunk.columns[1].values.get(1)), -1);
    }

    #[test]
    fn hard_end_without_trailing_newline_counts_as_row() {
        let chunk = scan(b"1,2,3");
        assert_eq!(chunk.nrows, 1);
    }

    #[test]
    fn empty_input_has_no_rows_and_no_columns() {
        let chunk = scan(b"");
        assert_eq!(chunk.nrows, 0);
        assert!(chunk.columns.is_empty());
    }

    #[test]
    fn quoted_cell_with_embedded_newline_stays_in_one_row() {
        let chunk = scan(b"\"a\nb\",2\n3,4\n");
        assert_eq!(chunk.nrows, 2);
        assert_eq!(chunk.columns[0].ty, ColumnType::String);
    }

    #[test]
    fn doubled_quote_is_not_unescaped_when_excel_flag_unset() {
        let input = b"\"a\"\"b\",2\n";
        let chunk = scan_chunk(
            input,
            0,
            0,
            input.len(),
            b',',
            Flags {
                excel_quote_escape: false,
            },
            -1,
            f64::NAN,
            true,
        );
        assert_eq!(chunk.nrows, 1);
        assert_eq!(chunk.columns[0].ty, ColumnType::String);
    }
}
