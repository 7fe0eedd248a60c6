//! Parallel processing utilities over disjoint row ranges.
//!
//! A row-major buffer is cut into contiguous, non-overlapping row ranges. Each
//! range owns its slice of the buffer exclusively, so workers never share
//! mutable state and no synchronization is needed until the final join.

use std::ops::Range;

use rayon::prelude::*;


/// Split `[0, n_rows)` into `n_workers` contiguous ranges.
///
/// Every range gets `n_rows / n_workers` rows; the last one also absorbs the
/// remainder, so the union is exactly `[0, n_rows)`. A worker count of zero is
/// treated as one.
pub fn row_ranges(n_rows: usize, n_workers: usize) -> Vec<Range<usize>> {
    let n_workers = n_workers.max(1);
    let rows_per_worker = n_rows / n_workers;

    (0..n_workers)
        .map(|i| {
            let start = i * rows_per_worker;
            let stop = if i == n_workers - 1 {
                n_rows
            } else {
                (i + 1) * rows_per_worker
            };
            start..stop
        })
        .collect()
}

/// Cut a row-major slice into mutable chunks, one per range.
///
/// The ranges must be contiguous and ascending, as produced by [`row_ranges`].
pub fn split_rows_mut<'a, T>(
    data: &'a mut [T],
    width: usize,
    ranges: &[Range<usize>],
) -> Vec<&'a mut [T]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = data;
    let mut next_row = 0;

    for range in ranges {
        assert_eq!(range.start, next_row, "row ranges must be contiguous");
        let (chunk, tail) = rest.split_at_mut(range.len() * width);
        chunks.push(chunk);
        rest = tail;
        next_row = range.end;
    }

    chunks
}

/// Run `f` once per row range of `data`, each call receiving its range and the
/// matching mutable rows.
///
/// With one worker everything runs on the calling thread. Otherwise a dedicated
/// rayon pool with exactly `n_workers` threads executes the ranges. Results are
/// returned in range order.
pub fn run_row_ranges<T, R, F>(
    data: &mut [T],
    width: usize,
    n_workers: usize,
    f: F,
) -> Result<Vec<R>, rayon::ThreadPoolBuildError>
where
    T: Send,
    R: Send,
    F: Fn(Range<usize>, &mut [T]) -> R + Sync,
{
    let height = if width == 0 { 0 } else { data.len() / width };
    let ranges = row_ranges(height, n_workers);
    let chunks = split_rows_mut(data, width, &ranges);

    if ranges.len() == 1 {
        return Ok(ranges
            .into_iter()
            .zip(chunks)
            .map(|(range, chunk)| f(range, chunk))
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ranges.len())
        .build()?;

    Ok(pool.install(|| {
        ranges
            .into_par_iter()
            .zip(chunks.into_par_iter())
            .map(|(range, chunk)| f(range, chunk))
            .collect()
    }))
}
