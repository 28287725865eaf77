//! C4: type reconciler.
//!
//! Grounded in `original_source/src/fastcsv.c`'s `allocate_arrays` (lines
//! 383-489), which walks every thread's per-column result before a
//! single destination array is sized and allocated. A column's final
//! type is the supremum of every chunk's independently-inferred type
//! for that column (spec.md's type lattice, `types::ColumnType`'s `Ord`
//! impl); its final width is the widest STRING cell any chunk saw. A
//! column absent from some chunk entirely (every row in that chunk was
//! shorter than the file's widest row) still needs an entry here so the
//! materializer can pad it; it contributes no type/width information,
//! only silence.

use crate::chunk::Chunk;
use crate::types::ColumnType;

/// The reconciled shape of one output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPlan {
    pub ty: ColumnType,
    pub width: usize,
}

/// Computes the final type and width of every column across all chunks
/// (including any boundary chunks produced by `fixup.rs`).
///
/// The result's length is the widest row seen anywhere in the file.
pub fn reconcile(chunks: &[Chunk<'_>]) -> Vec<ColumnPlan> {
    let ncols = chunks.iter().map(|c| c.columns.len()).max().unwrap_or(0);
    let mut plans = vec![
        ColumnPlan {
            ty: ColumnType::Int32,
            width: 0,
        };
        ncols
    ];
    for chunk in chunks {
        for (idx, col) in chunk.columns.iter().enumerate() {
            if col.ty > plans[idx].ty {
                plans[idx].ty = col.ty;
            }
            if col.width > plans[idx].width {
                plans[idx].width = col.width;
            }
        }
    }
    plans
}

/// Total row count across all chunks, in file order.
pub fn total_rows(chunks: &[Chunk<'_>]) -> usize {
    chunks.iter().map(|c| c.nrows).sum()
}
