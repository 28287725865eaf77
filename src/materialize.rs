//! C5: stage-2 materializer.
//!
//! Grounded in `original_source/src/fastcsv.c`'s `fill_arrays` (lines
//! 230-381), which walks every chunk's per-column results a second time
//! now that `reconcile.rs` has settled each column's final type and
//! width, and writes into the single destination array C4 allocated.
//!
//! A numeric column's values are copied straight out of its
//! [`crate::chunk::ColumnDescriptor`] arena (narrowing `i64` to `i32`,
//! or reinterpreting `i64` bits as `f64`, when a chunk's local type was
//! narrower than the reconciled final type). A STRING column's cells
//! are instead re-derived from the chunk's raw bytes via `row_starts`
//! and `offsets`: a STRING column's own chunk dropped its value arena
//! on promotion (`ColumnDescriptor::promote_to_string`), and a
//! numerically-typed chunk never had string bytes staged at all, so
//! there is no shortcut around re-reading the original bytes here.

use crate::chunk::Chunk;
use crate::error::FastCsvError;
use crate::reconcile::ColumnPlan;
use crate::types::ColumnType;
use crate::util::write_string_cell;
use crate::ResultSink;

/// Writes every chunk's data into the columns `sink` allocates.
///
/// `total_rows` must equal the sum of `chunk.nrows` across `chunks`.
pub fn materialize(
    chunks: &[Chunk<'_>],
    plans: &[ColumnPlan],
    total_rows: usize,
    missing_int: i64,
    missing_float: f64,
    excel_quote_escape: bool,
    sink: &mut dyn ResultSink,
) -> Result<(), FastCsvError> {
    for (col_idx, plan) in plans.iter().enumerate() {
        let ty = sink.fix_column_type(col_idx, plan.ty);
        let elem_size = ty.element_size(plan.width);
        let expected = total_rows * elem_size;
        let buf = sink.add_column(col_idx, ty, total_rows, plan.width);
        if buf.len() < expected {
            return Err(FastCsvError::ShortColumnBuffer {
                col_idx,
                expected,
                actual: buf.len(),
            });
        }

        let mut row_base = 0usize;
        for chunk in chunks {
            if ty == ColumnType::String {
                let cell_ranges = cell_ranges_by_row(chunk);
                for r in 0..chunk.nrows {
                    let dest = &mut buf[(row_base + r) * elem_size..(row_base + r + 1) * elem_size];
                    match cell_ranges[r].get(col_idx) {
                        Some(&(s, e)) => {
                            write_string_cell(chunk.data, s, e, dest, excel_quote_escape);
                        }
                        None => dest.iter_mut().for_each(|b| *b = 0),
                    }
                }
            } else if col_idx < chunk.columns.len() {
                let col = &chunk.columns[col_idx];
                for r in 0..chunk.nrows {
                    let dest = &mut buf[(row_base + r) * elem_size..(row_base + r + 1) * elem_size];
                    if r < col.first_row {
                        write_missing_numeric(ty, missing_int, missing_float, dest);
                    } else {
                        let raw = col.values.get(r - col.first_row);
                        write_numeric_value(col.ty, ty, raw, dest);
                    }
                }
            } else {
                for r in 0..chunk.nrows {
                    let dest = &mut buf[(row_base + r) * elem_size..(row_base + r + 1) * elem_size];
                    write_missing_numeric(ty, missing_int, missing_float, dest);
                }
            }
            row_base += chunk.nrows;
        }
    }
    Ok(())
}

/// Reconstructs, for every row in `chunk`, the raw `(start, end)` byte
/// range of each cell the stage-1 scan recorded. The offsets table
/// stores only per-cell end positions relative to the row's start, so
/// this walks it once per chunk and reuses the result across every
/// STRING column rather than re-deriving it per column.
fn cell_ranges_by_row(chunk: &Chunk<'_>) -> Vec<Vec<(usize, usize)>> {
    let mut rows = Vec::with_capacity(chunk.nrows);
    let mut pos = 0usize;
    for r in 0..chunk.nrows {
        let row_start = chunk.row_starts.get(r) as usize;
        let count = chunk.offsets.get(pos) as usize;
        pos += 1;
        let mut cells = Vec::with_capacity(count);
        let mut prev_end = row_start;
        for c in 0..count {
            let end = row_start + chunk.offsets.get(pos) as usize;
            pos += 1;
            let start = if c == 0 { row_start } else { prev_end + 1 };
            cells.push((start, end));
            prev_end = end;
        }
        rows.push(cells);
    }
    rows
}

fn write_numeric_value(local_ty: ColumnType, final_ty: ColumnType, raw: [u8; 8], dest: &mut [u8]) {
    match final_ty {
        ColumnType::Int32 => {
            let v = i64::from_ne_bytes(raw) as i32;
            dest.copy_from_slice(&v.to_ne_bytes());
        }
        ColumnType::Int64 => {
            let v = i64::from_ne_bytes(raw);
            dest.copy_from_slice(&v.to_ne_bytes());
        }
        ColumnType::Double => {
            let v = if local_ty == ColumnType::Double {
                f64::from_ne_bytes(raw)
            } else {
                i64::from_ne_bytes(raw) as f64
            };
            dest.copy_from_slice(&v.to_ne_bytes());
        }
        ColumnType::String => unreachable!("String columns are handled separately"),
    }
}

fn write_missing_numeric(ty: ColumnType, missing_int: i64, missing_float: f64, dest: &mut [u8]) {
    match ty {
        ColumnType::Int32 => dest.copy_from_slice(&(missing_int as i32).to_ne_bytes()),
        ColumnType::Int64 => dest.copy_from_slice(&missing_int.to_ne_bytes()),
        ColumnType::Double => dest.copy_from_slice(&missing_float.to_ne_bytes()),
        ColumnType::String => dest.iter_mut().for_each(|b| *b = 0),
    }
}
