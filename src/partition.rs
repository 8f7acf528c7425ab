//! Workload partitioner
//!
//! Splits a flat list of work items into K balanced sub-lists, one per
//! worker, using round-robin (stride-K) assignment. Round-robin rather than
//! contiguous blocks keeps the tail of a cost-correlated input list from
//! landing entirely in the last worker.

use crate::error::{Error, Result};

/// Split `items` into `workers` sub-lists by round-robin assignment
///
/// Item `i` goes to partition `i % workers`, so relative order is preserved
/// within each partition and partition sizes differ by at most one. If there
/// are fewer items than workers, the trailing partitions are empty.
///
/// Returns `Error::InvalidInput` when `workers` is zero.
///
/// # Example
///
/// ```
/// use cutout_dl::partition::round_robin;
///
/// let parts = round_robin(vec!['a', 'b', 'c', 'd', 'e'], 2).unwrap();
/// assert_eq!(parts, vec![vec!['a', 'c', 'e'], vec!['b', 'd']]);
/// ```
pub fn round_robin<T>(items: Vec<T>, workers: usize) -> Result<Vec<Vec<T>>> {
    if workers == 0 {
        return Err(Error::InvalidInput(
            "partition count must be at least 1".to_string(),
        ));
    }

    let mut partitions: Vec<Vec<T>> = Vec::with_capacity(workers);
    let per_worker = items.len().div_ceil(workers);
    for _ in 0..workers {
        partitions.push(Vec::with_capacity(per_worker));
    }

    for (i, item) in items.into_iter().enumerate() {
        partitions[i % workers].push(item);
    }

    Ok(partitions)
}
