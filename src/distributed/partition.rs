//! Dataset partitioning
//!
//! The coordinator splits the dataset once, before the first round, into one
//! contiguous range per worker. Every range but the last non-empty one holds
//! `ceil(n / workers)` observations; the last non-empty range holds the
//! remainder. When `ceil` rounding leaves nothing for the trailing workers they
//! get an empty range, so each worker still receives exactly one partition.

use std::ops::Range;

/// Contiguous partition ranges for `workers` workers over `n` observations
///
/// Ranges are disjoint, ordered and cover `0..n`.
///
/// # Examples
///
/// ```
/// use kcluster::distributed::partition::partition_ranges;
///
/// assert_eq!(partition_ranges(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(partition_ranges(5, 4), vec![0..2, 2..4, 4..5, 5..5]);
/// ```
pub fn partition_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }

    let split_size = n.div_ceil(workers);

    (0..workers)
        .map(|i| {
            let start = (i * split_size).min(n);
            let end = (start + split_size).min(n);
            start..end
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(partition_ranges(12, 3), vec![0..4, 4..8, 8..12]);
    }

    #[test]
    fn test_remainder_goes_to_last() {
        assert_eq!(partition_ranges(10, 4), vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn test_more_workers_than_observations() {
        assert_eq!(partition_ranges(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
    }

    #[test]
    fn test_zero_workers() {
        assert!(partition_ranges(10, 0).is_empty());
    }

    #[test]
    fn test_ranges_cover_dataset_disjointly() {
        for n in 0..40 {
            for workers in 1..9 {
                let ranges = partition_ranges(n, workers);
                assert_eq!(ranges.len(), workers);

                let total: usize = ranges.iter().map(|r| r.len()).sum();
                assert_eq!(total, n, "n={} workers={}", n, workers);

                let mut expected_start = 0;
                for r in &ranges {
                    assert_eq!(r.start, expected_start);
                    expected_start = r.end;
                }
                assert_eq!(expected_start, n);
            }
        }
    }
}
