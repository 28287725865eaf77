//! Error type for [`crate::parse`].
//!
//! Most of what spec callers think of as "errors" are not represented
//! here at all: type promotion, ragged rows, empty numeric cells, and
//! clamped exponents are all recovered silently and deterministically
//! (see SPEC_FULL.md §7, categories 1 and 2). The only surfaced failure
//! mode is a misconfigured call or a host allocator that didn't hold up
//! its end of the [`crate::ResultSink`] contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FastCsvError {
    #[error("separator byte {0:#04x} is not allowed (must not be newline, CR, or quote)")]
    InvalidSeparator(u8),

    #[error("thread count must be at least 1")]
    InvalidThreadCount,

    #[error(
        "host column allocator returned a buffer of {actual} bytes, short of the {expected} bytes requested for column {col_idx}"
    )]
    ShortColumnBuffer {
        col_idx: usize,
        expected: usize,
        actual: usize,
    },
}
