//! C1: scan one CSV cell as a number, producing either an integer
//! decode, a double decode, or a parse failure that forces the column
//! to STRING.
//!
//! Grounded in the numeric accumulation arm of `parse_stage1` in
//! `original_source/src/fastcsv.c` (the `goodend` label and the digit
//! loop it falls through from) and in `fastcsv_todouble.h`'s
//! power-of-ten scaling. The C source hand-rolls the decimal-to-binary
//! conversion with a precomputed power table; this implementation keeps
//! the cell-boundary lexing (sign, digit run, at most one decimal
//! point, optional exponent, NaN/Inf tokens) but delegates the actual
//! decimal-to-binary conversion to `i64`/`f64`'s `FromStr`, which is
//! already correctly rounded and already saturates out-of-range
//! exponents to `0.0`/`±∞`, exactly the clamping behavior spec.md
//! §4.1 asks for. Reimplementing Dragon4/Grisu by hand here would only
//! risk reintroducing the rounding bugs those algorithms exist to fix.

use std::str;

/// Outcome of attempting to parse one CSV cell as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeOutcome {
    /// No fractional or exponent part, and the mantissa fits in `i64`.
    Int(i64),
    /// Has a fractional part, an exponent, overflowed `i64`, or is a
    /// NaN/Inf token.
    Double(f64),
    /// Not a recognizable number. The caller promotes the column to
    /// STRING and re-scans the cell as a string.
    Invalid,
}

/// Scans `cell` (the raw bytes of one unquoted candidate numeric cell,
/// with no separator or newline included) as a number.
///
/// A leading `"` (or any other byte outside the numeric grammar) yields
/// `Invalid`, since a quoted cell can never be a bare number here: the
/// caller is expected to re-scan it as a string (spec.md §4.1 outcome 3,
/// "stray quote ... the column is promoted to STRING").
pub fn decode_numeric_cell(cell: &[u8]) -> DecodeOutcome {
    if cell.is_empty() {
        return DecodeOutcome::Invalid;
    }

    let text = match str::from_utf8(cell) {
        Ok(s) => s,
        Err(_) => return DecodeOutcome::Invalid,
    };

    let bytes = text.as_bytes();
    let mut i = 0;
    if bytes[0] == b'+' || bytes[0] == b'-' {
        i += 1;
    }

    // NaN/Inf literals, optionally signed, case-insensitive. These are
    // numeric tokens that always promote an INT column straight to
    // DOUBLE (see DESIGN.md Open Question 2).
    let rest = &text[i..];
    if rest.eq_ignore_ascii_case("nan")
        || rest.eq_ignore_ascii_case("inf")
        || rest.eq_ignore_ascii_case("infinity")
    {
        return match text.parse::<f64>() {
            Ok(v) => DecodeOutcome::Double(v),
            Err(_) => DecodeOutcome::Invalid,
        };
    }

    let mut has_digits = false;
    let mut has_frac = false;
    let mut has_exp = false;

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        has_digits = true;
        i += 1;
    }

    if i < bytes.len() && bytes[i] == b'.' {
        has_frac = true;
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            has_digits = true;
            i += 1;
        }
    }

    if !has_digits {
        return DecodeOutcome::Invalid;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mark = i;
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_digits_start {
            has_exp = true;
            i = j;
        } else {
            i = mark;
        }
    }

    if i != bytes.len() {
        // Trailing garbage that doesn't fit the grammar: a stray quote,
        // a second decimal point, stray letters, etc.
        return DecodeOutcome::Invalid;
    }

    if !has_frac && !has_exp {
        match text.parse::<i64>() {
            Ok(v) => DecodeOutcome::Int(v),
            Err(_) => match text.parse::<f64>() {
                // Mantissa overflowed i64 (spec.md §4.1 outcome "mantissa
                // overflow"): fall back to DOUBLE with the same digits.
                Ok(v) => DecodeOutcome::Double(v),
                Err(_) => DecodeOutcome::Invalid,
            },
        }
    } else {
        match text.parse::<f64>() {
            Ok(v) => DecodeOutcome::Double(v),
            Err(_) => DecodeOutcome::Invalid,
        }
    }
}
