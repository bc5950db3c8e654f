//! Centroid initialization
//!
//! Picks `k` distinct starting centroids uniformly at random from the dataset,
//! without replacement. A drawn observation that equals (by value) an already
//! chosen centroid is rejected and redrawn.
//!
//! Redrawing alone can take a long time when few unused values remain, so the
//! number of redraws per centroid is capped. Once the cap is hit the next
//! centroid is drawn directly from the occurrences of values not chosen yet,
//! which yields the same distribution as redrawing until success. Datasets
//! with fewer than `k` distinct values are rejected up front.

use super::{CentroidSet, ClusterError, ClusteringSettings};
use crate::observation::Observation;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Random centroid initializer
pub struct CentroidInitializer {
    rng: Xoshiro256PlusPlus,
    resample_limit: usize,
}

impl CentroidInitializer {
    pub const DEFAULT_RESAMPLE_LIMIT: usize = 1_000;

    /// Create an initializer with a random seed
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
            resample_limit: Self::DEFAULT_RESAMPLE_LIMIT,
        }
    }

    /// Create an initializer with a specific seed
    ///
    /// Useful for reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            resample_limit: Self::DEFAULT_RESAMPLE_LIMIT,
        }
    }

    pub fn from_settings(settings: &ClusteringSettings) -> Self {
        let init = match settings.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        init.resample_limit(settings.resample_limit)
    }

    /// Set the number of redraws allowed per centroid
    pub fn resample_limit(mut self, limit: usize) -> Self {
        self.resample_limit = limit.max(1);
        self
    }

    /// Select `k` distinct centroids from `dataset`
    pub fn select<O: Observation>(&mut self, dataset: &[O], k: usize) -> Result<CentroidSet<O>, ClusterError> {
        if k == 0 {
            return Err(ClusterError::ZeroClusters);
        }
        if dataset.is_empty() {
            return Err(ClusterError::EmptyDataset);
        }
        if k > dataset.len() {
            return Err(ClusterError::TooManyClusters { k, size: dataset.len() });
        }

        let distinct = count_distinct(dataset, k);
        if distinct < k {
            return Err(ClusterError::InsufficientDistinct { k, distinct });
        }

        let mut centroids: CentroidSet<O> = Vec::with_capacity(k);

        while centroids.len() < k {
            let next = self.draw_unused(dataset, &centroids);
            centroids.push(next.clone());
        }

        Ok(centroids)
    }

    /// Draw one observation whose value is not in `chosen`
    ///
    /// Callers guarantee at least one such value exists.
    fn draw_unused<'a, O: Observation>(&mut self, dataset: &'a [O], chosen: &[O]) -> &'a O {
        for _ in 0..self.resample_limit {
            let candidate = &dataset[self.rng.gen_range(0..dataset.len())];
            if !chosen.contains(candidate) {
                return candidate;
            }
        }

        let remaining: Vec<&O> = dataset.iter()
            .filter(|obs| !chosen.contains(obs))
            .collect();
        remaining[self.rng.gen_range(0..remaining.len())]
    }
}

impl Default for CentroidInitializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of distinct values in `dataset`, counting no further than `limit`
fn count_distinct<O: PartialEq>(dataset: &[O], limit: usize) -> usize {
    let mut seen: Vec<&O> = Vec::with_capacity(limit);

    for obs in dataset {
        if seen.len() >= limit {
            break;
        }
        if !seen.contains(&obs) {
            seen.push(obs);
        }
    }

    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Point;

    fn grid(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64, (i % 3) as f64)).collect()
    }

    #[test]
    fn test_select_distinct() {
        let data = grid(50);
        let mut init = CentroidInitializer::with_seed(7);
        let centroids = init.select(&data, 10).unwrap();

        assert_eq!(centroids.len(), 10);
        for (i, c) in centroids.iter().enumerate() {
            assert!(data.contains(c));
            assert!(!centroids[i + 1..].contains(c), "duplicate centroid {:?}", c);
        }
    }

    #[test]
    fn test_select_seeded_is_reproducible() {
        let data = grid(100);
        let a = CentroidInitializer::with_seed(99).select(&data, 5).unwrap();
        let b = CentroidInitializer::with_seed(99).select(&data, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_k_equals_size() {
        let data = grid(20);
        let mut init = CentroidInitializer::with_seed(1).resample_limit(1);
        let centroids = init.select(&data, 20).unwrap();

        assert_eq!(centroids.len(), 20);
        for p in &data {
            assert!(centroids.contains(p));
        }
    }

    #[test]
    fn test_select_with_duplicates() {
        let mut data = vec![Point::new(1.0, 1.0); 30];
        data.push(Point::new(2.0, 2.0));

        let centroids = CentroidInitializer::with_seed(3).select(&data, 2).unwrap();
        assert!(centroids.contains(&Point::new(1.0, 1.0)));
        assert!(centroids.contains(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_select_insufficient_distinct_fails() {
        let data = vec![Point::new(1.0, 1.0); 10];
        let result = CentroidInitializer::with_seed(3).select(&data, 2);
        assert_eq!(result, Err(ClusterError::InsufficientDistinct { k: 2, distinct: 1 }));
    }

    #[test]
    fn test_select_invalid_k() {
        let data = grid(3);
        let mut init = CentroidInitializer::with_seed(0);

        assert_eq!(init.select(&data, 0), Err(ClusterError::ZeroClusters));
        assert_eq!(init.select(&data, 4), Err(ClusterError::TooManyClusters { k: 4, size: 3 }));
        assert_eq!(init.select::<Point>(&[], 1), Err(ClusterError::EmptyDataset));
    }

    #[test]
    fn test_count_distinct_stops_at_limit() {
        let data = grid(100);
        assert_eq!(count_distinct(&data, 5), 5);
        assert_eq!(count_distinct(&[1, 1, 2, 2, 3], 10), 3);
    }
}
