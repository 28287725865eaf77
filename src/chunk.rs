//! C2/C3 shared state: append-only arenas, per-column accumulators, and
//! the per-chunk scan result they live in.
//!
//! Grounded in `original_source/src/fastcsv.c`'s `LinkedBuf`/`LinkedLink`
//! (lines 32-68) and `Column` (lines 122-175). The C source threads its
//! own intrusive linked list of fixed-size blocks so it can grow a
//! column's value buffer without a worst-case-sized upfront allocation
//! and without ever relocating already-written elements (which would
//! invalidate the raw pointers stage 2 keeps into them). Rust's `Vec<T>`
//! already gives amortized-growth append without that pointer-stability
//! requirement (nothing downstream here holds a raw pointer into an
//! arena across a reallocation), so `Arena<T>` is a thin `Vec` wrapper
//! rather than a reimplementation of the block-linked-list structure.

use crate::types::ColumnType;

/// Append-only buffer of fixed-size elements.
///
/// A direct simplification of the C source's `LinkedBuf`: same "push and
/// never remove" usage pattern, without the block-linked-list machinery,
/// since nothing here needs pointer stability across growth.
#[derive(Debug, Clone, Default)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T: Copy> Arena<T> {
    pub fn new() -> Self {
        Arena { items: Vec::new() }
    }

    pub fn push(&mut self, value: T) -> usize {
        let idx = self.items.len();
        self.items.push(value);
        idx
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, idx: usize) -> T {
        self.items[idx]
    }

    pub fn set(&mut self, idx: usize, value: T) {
        self.items[idx] = value;
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

/// One column's accumulated state within a single chunk scan.
///
/// Values are stored pre-converted to their final on-the-wire byte
/// representation (`i64` or `f64` native-endian bytes) as they're
/// observed, so promotion (`promote_to_double`) only has to reinterpret
/// bytes already on hand rather than re-parsing source text.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub ty: ColumnType,
    /// Running maximum string cell width in bytes, meaningful only once
    /// (or if) the column becomes STRING.
    pub width: usize,
    /// Row index, relative to the owning chunk, of this column's first
    /// observed cell. Columns that only appear partway through a ragged
    /// chunk still need every earlier row padded before this point.
    pub first_row: usize,
    pub values: Arena<[u8; 8]>,
}

impl ColumnDescriptor {
    pub fn new(first_row: usize) -> Self {
        ColumnDescriptor {
            ty: ColumnType::Int32,
            width: 0,
            first_row,
            values: Arena::new(),
        }
    }

    pub fn note_width(&mut self, width: usize) {
        if width > self.width {
            self.width = width;
        }
    }

    pub fn push_int(&mut self, v: i64) {
        if self.ty == ColumnType::Double {
            self.push_double(v as f64);
            return;
        }
        if v < i32::MIN as i64 || v > i32::MAX as i64 {
            self.ty = ColumnType::Int64;
        }
        self.values.push(v.to_ne_bytes());
    }

    pub fn push_double(&mut self, v: f64) {
        self.ty = ColumnType::Double;
        self.values.push(v.to_ne_bytes());
    }

    /// Re-interprets every previously-stored `i32`/`i64` element as the
    /// `f64` it numerically equals, then marks the column DOUBLE.
    ///
    /// See DESIGN.md Open Question 2: this is the mechanism by which an
    /// INT column that later sees a fractional value, an exponent, or a
    /// NaN/Inf token becomes a DOUBLE column instead of a STRING column.
    pub fn promote_to_double(&mut self) {
        if self.ty == ColumnType::Double {
            return;
        }
        for slot in self.values.iter_mut() {
            let as_int = i64::from_ne_bytes(*slot);
            *slot = (as_int as f64).to_ne_bytes();
        }
        self.ty = ColumnType::Double;
    }

    /// Drops the numeric value arena: a STRING column's cell content is
    /// owned by stage 2's rewritten offsets table instead, materialized
    /// directly from chunk byte ranges rather than staged through here.
    pub fn promote_to_string(&mut self) {
        self.ty = ColumnType::String;
        self.values.truncate(0);
    }

    pub fn push_missing(&mut self, missing_int: i64, missing_float: f64) {
        match self.ty {
            ColumnType::String => {}
            ColumnType::Double => self.push_double(missing_float),
            ColumnType::Int32 | ColumnType::Int64 => self.push_int(missing_int),
        }
    }
}

/// Result of scanning one chunk of the input buffer (C2's output, and
/// C3's input/output).
///
/// `data` is the *whole* input buffer, not a copy of this chunk's slice:
/// every chunk needs read access to the bytes just past its own
/// `soft_end` to find where its last row actually terminates, and C3's
/// fix-up needs the bytes spanning two adjacent chunks' boundary. Owning
/// a private copy per chunk would multiply memory use by the thread
/// count for no benefit.
pub struct Chunk<'a> {
    pub chunk_idx: usize,
    pub data: &'a [u8],
    /// Byte offset this chunk was asked to start scanning at.
    pub start: usize,
    /// Byte offset this chunk was asked to stop at (the next chunk's
    /// `start`), not necessarily a row boundary.
    pub soft_end: usize,
    /// Byte offset this chunk actually stopped scanning at: the end of
    /// `data`, or (for all but the last chunk) one past the first
    /// newline at or after `soft_end`.
    pub buf_end: usize,
    /// Byte offset of the start of the row straddling `soft_end`, i.e.
    /// the last row this chunk scanned speculatively and which C3 will
    /// re-derive authoritatively. Equal to `buf_end` when the chunk's
    /// last row happened to end exactly at `soft_end`.
    pub found_end: usize,
    pub columns: Vec<ColumnDescriptor>,
    /// Per-record cell count followed by that many running end-offsets
    /// relative to the record's start byte (DESIGN.md Open Question 3).
    pub offsets: Arena<u32>,
    /// Absolute byte offset (into `data`) of each record's first byte,
    /// one entry per row, in file order. Lets `materialize.rs` recover
    /// a cell's exact raw byte range regardless of which type this
    /// chunk happened to infer for its column, needed when a column
    /// is promoted to STRING by a *different* chunk's evidence and this
    /// chunk's numerically-typed cells must still be rendered as text.
    pub row_starts: Arena<u32>,
    pub nrows: usize,
    /// Set when a quoted cell's closing quote was not found before
    /// `buf_end`, and `buf_end` wasn't the true end of `data`, meaning
    /// `buf_end` was chosen too early and the scan needs to be redone
    /// with more room. Only `fixup.rs`'s boundary re-scan needs this;
    /// an ordinary `scan_chunk` call always succeeds against the full
    /// remaining buffer, so normal chunks never set it.
    pub truncated: bool,
}

impl<'a> Chunk<'a> {
    pub fn column_mut(&mut self, col_idx: usize, row_idx: usize) -> &mut ColumnDescriptor {
        while self.columns.len() <= col_idx {
            self.columns.push(ColumnDescriptor::new(row_idx));
        }
        &mut self.columns[col_idx]
    }

    /// Drops this chunk's last scanned row.
    ///
    /// Used by `coordinate.rs` before stitching in `fixup.rs`'s
    /// boundary re-scan: every chunk but the last one treats its final
    /// row as disputed (it may really belong to, or be swallowed by,
    /// the following chunk), so the authoritative re-scan replaces it
    /// rather than both copies being counted.
    pub fn truncate_last_row(&mut self) {
        if self.nrows == 0 {
            return;
        }
        let drop_row = self.nrows - 1;

        // Columns are created in non-decreasing row order as they're
        // first encountered, so any column whose first appearance was
        // the dropped row must be a trailing run in `columns`.
        while let Some(last) = self.columns.last() {
            if last.first_row == drop_row {
                self.columns.pop();
            } else {
                break;
            }
        }
        for col in &mut self.columns {
            // STRING columns never push into `values` (`promote_to_string`
            // truncates it to 0), so a surviving STRING column that
            // predates the dropped row has nothing here to pop.
            let len = col.values.len();
            if len > 0 {
                col.values.truncate(len - 1);
            }
        }

        let mut pos = 0usize;
        for _ in 0..drop_row {
            let count = self.offsets.get(pos) as usize;
            pos += 1 + count;
        }
        self.offsets.truncate(pos);
        self.row_starts.truncate(drop_row);
        self.nrows = drop_row;
    }
}
