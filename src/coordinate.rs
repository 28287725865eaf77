//! C7: coordinator. Partitions the buffer, spawns workers, and
//! synchronizes stage-1 scanning against stage-2 materialization with
//! two barriers.
//!
//! Grounded in `original_source/src/fastcsv.c`'s `parse_csv`/
//! `parse_thread` (lines 852-1045), which partition the buffer across a
//! fixed worker-thread pool and use `pthread_barrier_t` (with
//! `PTHREAD_BARRIER_SERIAL_THREAD` electing one thread to run the
//! sequential fix-up/allocation step) to hand off between the parallel
//! scan and the allocation it depends on. `std::thread::scope` +
//! `std::sync::Barrier` is the same shape in safe Rust:
//! `BarrierWaitResult::is_leader()` plays the role of
//! `PTHREAD_BARRIER_SERIAL_THREAD`.
//!
//! Stage 2 itself (`materialize.rs`) runs on the leader thread only.
//! `ResultSink::add_column` hands out a `&mut [u8]` tied to a single
//! mutable borrow of the sink, so splitting writes to one column across
//! threads would need unsafe pointer slicing the way the C source's raw
//! destination array supports; out of scope here. The second barrier
//! is kept anyway so every worker still passes through the same
//! two-phase handshake the partitioning logic assumes, rather than
//! silently collapsing to a single rendezvous.

use log::debug;
use std::sync::{Barrier, Mutex};
use std::thread;

use crate::chunk::Chunk;
use crate::error::FastCsvError;
use crate::fixup::fixup_boundary;
use crate::reconcile::{reconcile, total_rows, ColumnPlan};
use crate::scan::scan_chunk;
use crate::types::{Flags, ParseOptions};
use crate::ResultSink;

/// Parses `data` (the record body, header row if any already
/// stripped by `header.rs`) into `sink`, splitting work across
/// `options.threads` worker threads.
pub fn parse_body(
    data: &[u8],
    options: &ParseOptions,
    sink: &mut dyn ResultSink,
) -> Result<(), FastCsvError> {
    if data.is_empty() {
        return Ok(());
    }

    let requested_threads = options.threads.max(1);
    let sep = options.separator;
    let flags = options.flags;
    let missing_int = options.missing_int;
    let missing_float = options.missing_float;

    let splits = split_points(data, requested_threads);
    let nthreads = splits.len();

    let slots: Vec<Mutex<Option<Chunk<'_>>>> = (0..nthreads).map(|_| Mutex::new(None)).collect();
    let barrier1 = Barrier::new(nthreads);
    let barrier2 = Barrier::new(nthreads);
    let staged: Mutex<Option<(Vec<Chunk<'_>>, Vec<ColumnPlan>, usize)>> = Mutex::new(None);
    let outcome: Mutex<Option<Result<(), FastCsvError>>> = Mutex::new(None);
    let sink_cell = Mutex::new(sink);

    thread::scope(|scope| {
        for k in 0..nthreads {
            let (start, soft_end) = splits[k];
            let slots = &slots;
            let barrier1 = &barrier1;
            let barrier2 = &barrier2;
            let staged = &staged;
            let outcome = &outcome;
            let sink_cell = &sink_cell;

            scope.spawn(move || {
                debug!("worker {k} scanning byte range [{start}, {soft_end})");
                let chunk = scan_chunk(
                    data,
                    k,
                    start,
                    soft_end,
                    sep,
                    flags,
                    missing_int,
                    missing_float,
                    false,
                );
                *slots[k].lock().unwrap() = Some(chunk);

                let is_leader = barrier1.wait().is_leader();
                if is_leader {
                    debug!("leader stitching {nthreads} chunk(s) and reconciling column types");
                    let owned: Vec<Chunk<'_>> = (0..nthreads)
                        .map(|i| slots[i].lock().unwrap().take().unwrap())
                        .collect();
                    let stitched = stitch_boundaries(data, sep, flags, missing_int, missing_float, owned);
                    let plans = reconcile(&stitched);
                    let total = total_rows(&stitched);
                    *staged.lock().unwrap() = Some((stitched, plans, total));
                }

                barrier2.wait();

                if is_leader {
                    let (stitched, plans, total) = staged.lock().unwrap().take().unwrap();
                    debug!("leader materializing {total} row(s) across {} column(s)", plans.len());
                    let mut sink_guard = sink_cell.lock().unwrap();
                    let result = crate::materialize::materialize(
                        &stitched,
                        &plans,
                        total,
                        missing_int,
                        missing_float,
                        flags.excel_quote_escape,
                        *sink_guard,
                    );
                    *outcome.lock().unwrap() = Some(result);
                }
            });
        }
    });

    outcome.into_inner().unwrap().unwrap_or(Ok(()))
}

/// Picks `threads` candidate byte ranges spanning `data`, each (save
/// the first) starting just past the first *safe* `\n` at or after an
/// evenly-spaced split point, where "safe" means not inside a quoted
/// cell. Candidate ranges that collapse to the same start (small input,
/// large thread count) are merged.
///
/// A quote-blind `memchr` for `\n` would happily land a split point
/// inside a quoted cell's embedded newline, handing the next worker a
/// `start` that is mid-quote rather than a record boundary; every row
/// that chunk scans from there on would be misparsed relative to the
/// quote state it never saw. `safe_newlines` walks the buffer once
/// up front, tracking quote parity, so every candidate here is a
/// newline `scan_chunk` can safely treat as `chunk_idx`'s invariant:
/// "every chunk starts exactly at a record boundary".
fn split_points(data: &[u8], threads: usize) -> Vec<(usize, usize)> {
    let len = data.len();
    let safe = safe_newlines(data);
    let mut starts = vec![0usize];
    for k in 1..threads {
        let naive = ((len as u128) * (k as u128) / (threads as u128)) as usize;
        let idx = safe.partition_point(|&pos| pos < naive);
        let start = match safe.get(idx) {
            Some(&pos) => pos + 1,
            None => len,
        };
        starts.push(start);
    }
    starts.dedup();

    let n = starts.len();
    let mut ranges = Vec::with_capacity(n);
    for i in 0..n {
        let soft_end = if i + 1 < n { starts[i + 1] } else { len };
        ranges.push((starts[i], soft_end));
    }
    ranges
}

/// Byte offsets of every `\n` in `data` that lies outside a quoted cell,
/// in ascending order.
///
/// A single forward pass toggles quote state on every `"` byte
/// (`memchr2` over both `"` and `\n` at once) rather than parsing cells;
/// a doubled `""` toggles twice and nets no state change, which is
/// exactly the parity a boundary search needs regardless of whether the
/// Excel quote-escape convention is in effect for cell content.
fn safe_newlines(data: &[u8]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut in_quotes = false;
    let mut p = 0usize;
    while let Some(rel) = memchr::memchr2(b'"', b'\n', &data[p..]) {
        let idx = p + rel;
        if data[idx] == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            out.push(idx);
        }
        p = idx + 1;
    }
    out
}

/// Drops each non-final chunk's disputed last row and replaces it with
/// `fixup.rs`'s authoritative re-scan of the boundary it shares with
/// the next chunk.
fn stitch_boundaries<'a>(
    data: &'a [u8],
    sep: u8,
    flags: Flags,
    missing_int: i64,
    missing_float: f64,
    chunks: Vec<Chunk<'a>>,
) -> Vec<Chunk<'a>> {
    let n = chunks.len();
    if n <= 1 {
        return chunks;
    }

    let mut slots: Vec<Option<Chunk<'a>>> = chunks.into_iter().map(Some).collect();
    let mut result = Vec::with_capacity(n * 2 - 1);
    for i in 0..n {
        let mut chunk = slots[i].take().unwrap();
        let found_end = chunk.found_end;
        let soft_end = chunk.buf_end;
        if i < n - 1 {
            chunk.truncate_last_row();
        }
        result.push(chunk);
        if i < n - 1 {
            let boundary = fixup_boundary(data, sep, flags, missing_int, missing_float, found_end, soft_end);
            result.push(boundary);
        }
    }
    result
}
