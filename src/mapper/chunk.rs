//! Id-list partitioning and result aggregation.

use std::collections::HashSet;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Whether `len` values exceed one chunk.
pub fn needs_chunking(len: usize, max_chunk_size: NonZeroUsize) -> bool {
    len > max_chunk_size.get()
}

/// Split `values` left to right into chunks of `max_chunk_size`; the last
/// chunk holds the remainder.
pub fn partition(values: &[i32], max_chunk_size: NonZeroUsize) -> Vec<Vec<i32>> {
    values
        .chunks(max_chunk_size.get())
        .map(<[i32]>::to_vec)
        .collect()
}

/// Concatenate per-chunk results in chunk order.
pub fn concat<T>(parts: Vec<Vec<T>>) -> Vec<T> {
    parts.into_iter().flatten().collect()
}

/// Concatenate per-chunk results, keeping the first occurrence of each row.
pub fn union<T: Eq + Hash>(parts: Vec<Vec<T>>) -> Vec<T> {
    let rows = concat(parts);
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(rows.len());
        rows.iter().map(|row| seen.insert(row)).collect()
    };

    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}
