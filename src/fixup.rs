//! C3: boundary fix-up.
//!
//! Grounded in `original_source/src/fastcsv.c`'s `fixup_parse` (lines
//! 720-850). Each worker's stage-1 scan (`scan.rs`) picks its `buf_end`
//! by a naive, quote-blind search for the next `\n`, which can land
//! inside a quoted cell that embeds a literal newline and actually
//! belongs to the following chunk. `fixup_boundary` re-derives that one
//! ambiguous record authoritatively by re-scanning from the previous
//! chunk's `found_end`, growing the scanned window until the scan no
//! longer reports a cell truncated against its ceiling.
//!
//! The C source resolves the same ambiguity by aliasing a "non-owning
//! view" across the two chunks' buffers via raw pointers. Rust's
//! ownership model makes that aliasing awkward to express safely for no
//! real gain here (the boundary region is at most a few records), so
//! this produces its own freshly-scanned [`Chunk`] that callers copy the
//! relevant rows out of, rather than splicing pointers into the
//! original chunks' arenas (documented simplification; see DESIGN.md).

use crate::chunk::Chunk;
use crate::scan::scan_chunk;
use crate::types::Flags;

/// Re-scans the record(s) spanning a chunk boundary.
///
/// `prev_found_end` is the byte offset the previous chunk reported as
/// the start of its last (disputed) row; `soft_end` is the original
/// `buf_end` that chunk's naive scan computed. Returns a freshly-scanned
/// [`Chunk`] covering exactly the disputed region, extended as far as
/// necessary to resolve every quoted cell it contains.
pub fn fixup_boundary<'a>(
    data: &'a [u8],
    sep: u8,
    flags: Flags,
    missing_int: i64,
    missing_float: f64,
    prev_found_end: usize,
    soft_end: usize,
) -> Chunk<'a> {
    let mut candidate_soft_end = soft_end;
    loop {
        // `extend_past_soft_end: false` here: `candidate_soft_end` is
        // already known to be a real boundary (either the original
        // worker's `soft_end` or, on a later iteration, a newline this
        // function itself just found), so the scan should stop exactly
        // there rather than silently absorbing the following row.
        let candidate = scan_chunk(
            data,
            usize::MAX,
            prev_found_end,
            candidate_soft_end,
            sep,
            flags,
            missing_int,
            missing_float,
            false,
        );
        if !candidate.truncated || candidate.buf_end >= data.len() {
            return candidate;
        }
        // The ceiling cut a quoted multi-line cell short. Grow the
        // window past the next newline and try again.
        candidate_soft_end = match memchr::memchr(b'\n', &data[candidate.buf_end..]) {
            Some(rel) => candidate.buf_end + rel + 1,
            None => data.len(),
        };
    }
}
