//! Byte-level quote handling shared by the stage-1 scanner (`scan.rs`)
//! and the stage-2 materializer (`materialize.rs`).
//!
//! Grounded in `original_source/src/fastcsv.c`'s inline quote state
//! machine (`NEXTCHAR_INQUOTES`, lines 101-119): the C source advances
//! character-by-character with an `inquotes` flag threaded through the
//! call stack. Here that state machine is pulled out into two free
//! functions operating directly on byte slices: small standalone
//! byte/string helpers the rest of the crate composes rather than
//! inlines.

/// Finds the end of a CSV cell starting at `start`.
///
/// If `data[start]` is a `"`, the cell is quoted: scans past the
/// closing quote and then past any trailing bytes up to the next
/// separator or newline. When `excel_quote_escape` is set, a doubled
/// `""` is consumed as literal content instead of closing the cell (the
/// Excel `""`-escapes-as-`"` convention); when it is unset, the first
/// `"` closes the cell, full stop. Otherwise (unquoted cell) scans for
/// the first separator, `\n`, or `buf_end`.
///
/// Returns the offset of the terminating separator/newline byte, or
/// `buf_end` if the cell runs off the end of the scanned region
/// unterminated.
pub fn scan_string_extent(
    data: &[u8],
    start: usize,
    buf_end: usize,
    sep: u8,
    excel_quote_escape: bool,
) -> usize {
    let mut p = start;
    if p < buf_end && data[p] == b'"' {
        p += 1;
        if excel_quote_escape {
            loop {
                match memchr::memchr(b'"', &data[p..buf_end]) {
                    None => return buf_end,
                    Some(rel) => {
                        let quote_pos = p + rel;
                        if quote_pos + 1 < buf_end && data[quote_pos + 1] == b'"' {
                            // Doubled quote: literal `"`, keep scanning inside the cell.
                            p = quote_pos + 2;
                            continue;
                        }
                        p = quote_pos + 1;
                        break;
                    }
                }
            }
        } else {
            match memchr::memchr(b'"', &data[p..buf_end]) {
                None => return buf_end,
                Some(rel) => p += rel + 1,
            }
        }
    }
    while p < buf_end && data[p] != sep && data[p] != b'\n' {
        p += 1;
    }
    p
}

/// Writes the unescaped content of the cell `data[start..end]` into
/// `dest`, left-justified, zero-padding any remaining bytes.
///
/// `\r` is stripped unconditionally, inside and outside quotes
/// (DESIGN.md Open Question 1). A quoted cell has its surrounding
/// quotes removed. When `excel_quote_escape` is set, a doubled `"` is
/// collapsed to one literal `"` and the closing quote is taken to be
/// the cell's last byte; when unset, the closing quote is the first `"`
/// after the opening one and anything past it (up to `end`) is trailing
/// width, not content.
///
/// Returns the number of content bytes written (before zero padding).
/// `dest` must be at least as large as the unescaped content; the
/// caller sizes it from the same width the scan phase already measured.
pub fn write_string_cell(
    data: &[u8],
    start: usize,
    end: usize,
    dest: &mut [u8],
    excel_quote_escape: bool,
) -> usize {
    let mut n = 0;
    if start < end && data[start] == b'"' {
        let mut p = start + 1;
        if excel_quote_escape {
            let inner_end = if end > p && data[end - 1] == b'"' {
                end - 1
            } else {
                end
            };
            while p < inner_end {
                if data[p] == b'"' && p + 1 < inner_end && data[p + 1] == b'"' {
                    dest[n] = b'"';
                    n += 1;
                    p += 2;
                    continue;
                }
                if data[p] == b'\r' {
                    p += 1;
                    continue;
                }
                dest[n] = data[p];
                n += 1;
                p += 1;
            }
        } else {
            let inner_end = memchr::memchr(b'"', &data[p..end])
                .map(|rel| p + rel)
                .unwrap_or(end);
            while p < inner_end {
                if data[p] == b'\r' {
                    p += 1;
                    continue;
                }
                dest[n] = data[p];
                n += 1;
                p += 1;
            }
        }
    } else {
        for &b in &data[start..end] {
            if b == b'\r' {
                continue;
            }
            dest[n] = b;
            n += 1;
        }
    }
    for slot in &mut dest[n..] {
        *slot = 0;
    }
    n
}
