//! Synthetic dataset generation
//!
//! Produces well separated clusters for trying out both modes.
//!
//! # DNA strands
//!
//! Base strands are drawn uniformly at random and accepted only when they lie at
//! least `L/2` positions away from every base already chosen. Each cluster
//! holds its base strand plus members derived from it by `L/4 - 1` random base
//! substitutions, so every member stays within `L/4` of its base. Members are
//! unique within their cluster.
//!
//! # Points
//!
//! Cluster centers are drawn uniformly from a square and kept at a minimum
//! separation; members are Gaussian (`rand_distr::Normal`) around their center.
//!
//! Rejection sampling is capped by `max_attempts` per accepted value; running
//! out of attempts is an error rather than a hang.

use crate::observation::{DnaBase, DnaStrand, Observation, Point};
use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Parameters for strand datasets
#[derive(Debug, Clone)]
pub struct StrandClusters {
    pub clusters: usize,
    /// Strands per cluster, including the base strand
    pub strands_per_cluster: usize,
    pub strand_length: usize,
}

/// Parameters for point datasets
#[derive(Debug, Clone)]
pub struct PointClusters {
    pub clusters: usize,
    pub points_per_cluster: usize,
    /// Centers are drawn from `[0, extent)` on both axes
    pub extent: f64,
    /// Minimum distance between two centers
    pub min_separation: f64,
    /// Standard deviation of members around their center
    pub spread: f64,
}

/// Seedable synthetic data generator
pub struct DatasetGenerator {
    rng: Xoshiro256PlusPlus,
    max_attempts: usize,
}

impl DatasetGenerator {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

    /// Create a generator seeded from entropy
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Create a generator with a specific seed
    ///
    /// Useful for reproducible datasets.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Generate clustered DNA strands, cluster by cluster
    pub fn strands(&mut self, params: &StrandClusters) -> Result<Vec<DnaStrand>> {
        if params.clusters == 0 || params.strands_per_cluster == 0 || params.strand_length == 0 {
            anyhow::bail!(
                "Invalid strand parameters: clusters={}, strands_per_cluster={}, strand_length={}",
                params.clusters,
                params.strands_per_cluster,
                params.strand_length
            );
        }

        let base_separation = params.strand_length / 2;
        let member_radius = base_separation / 2;

        let mut bases: Vec<DnaStrand> = Vec::with_capacity(params.clusters);
        for cluster in 0..params.clusters {
            let base = self
                .attempt(|g| {
                    let candidate = g.random_strand(params.strand_length);
                    let far_enough = bases
                        .iter()
                        .all(|other| candidate.distance(other) >= base_separation as f64);
                    far_enough.then_some(candidate)
                })
                .with_context(|| {
                    format!(
                        "Could not place base strand {} at distance {} from the others",
                        cluster, base_separation
                    )
                })?;
            bases.push(base);
        }

        let mut strands = Vec::with_capacity(params.clusters * params.strands_per_cluster);
        for (cluster, base) in bases.iter().enumerate() {
            let mut members = vec![base.clone()];

            while members.len() < params.strands_per_cluster {
                let member = self
                    .attempt(|g| {
                        let candidate = g.mutate(base, member_radius.saturating_sub(1));
                        (!members.contains(&candidate)).then_some(candidate)
                    })
                    .with_context(|| {
                        format!(
                            "Could not generate {} unique strands for cluster {}",
                            params.strands_per_cluster, cluster
                        )
                    })?;
                members.push(member);
            }

            strands.extend(members);
        }

        Ok(strands)
    }

    /// Generate Gaussian point blobs, cluster by cluster
    pub fn points(&mut self, params: &PointClusters) -> Result<Vec<Point>> {
        if params.clusters == 0 || params.points_per_cluster == 0 {
            anyhow::bail!(
                "Invalid point parameters: clusters={}, points_per_cluster={}",
                params.clusters,
                params.points_per_cluster
            );
        }
        if !(params.extent > 0.0) {
            anyhow::bail!("Point extent must be positive, got {}", params.extent);
        }
        // Normal::new only rejects a non-finite spread
        if !(params.spread >= 0.0) || !params.spread.is_finite() {
            anyhow::bail!("Point spread must be finite and non-negative, got {}", params.spread);
        }

        let noise = Normal::new(0.0, params.spread)
            .with_context(|| format!("Invalid point spread: {}", params.spread))?;

        let mut centers: Vec<Point> = Vec::with_capacity(params.clusters);
        for cluster in 0..params.clusters {
            let center = self
                .attempt(|g| {
                    let candidate = Point::new(
                        g.rng.gen_range(0.0..params.extent),
                        g.rng.gen_range(0.0..params.extent),
                    );
                    let far_enough = centers
                        .iter()
                        .all(|other| candidate.distance(other) >= params.min_separation);
                    far_enough.then_some(candidate)
                })
                .with_context(|| {
                    format!(
                        "Could not place center {} at distance {} from the others",
                        cluster, params.min_separation
                    )
                })?;
            centers.push(center);
        }

        let mut points = Vec::with_capacity(params.clusters * params.points_per_cluster);
        for center in &centers {
            for _ in 0..params.points_per_cluster {
                points.push(Point::new(
                    center.x + noise.sample(&mut self.rng),
                    center.y + noise.sample(&mut self.rng),
                ));
            }
        }

        Ok(points)
    }

    /// Retry `draw` until it accepts a value or attempts run out
    fn attempt<T>(&mut self, mut draw: impl FnMut(&mut Self) -> Option<T>) -> Result<T> {
        for _ in 0..self.max_attempts {
            if let Some(value) = draw(self) {
                return Ok(value);
            }
        }
        anyhow::bail!("Gave up after {} attempts", self.max_attempts)
    }

    fn random_strand(&mut self, length: usize) -> DnaStrand {
        DnaStrand::new(
            (0..length)
                .map(|_| DnaBase::ALL[self.rng.gen_range(0..DnaBase::ALL.len())])
                .collect(),
        )
    }

    /// Copy of `base` with `substitutions` random positions changed to a different base
    ///
    /// Positions may repeat, so the result is at most `substitutions` away.
    fn mutate(&mut self, base: &DnaStrand, substitutions: usize) -> DnaStrand {
        let mut bases = base.bases().to_vec();

        for _ in 0..substitutions {
            let position = self.rng.gen_range(0..bases.len());
            let current = bases[position];
            let others: Vec<DnaBase> = DnaBase::ALL.into_iter().filter(|&b| b != current).collect();
            bases[position] = others[self.rng.gen_range(0..others.len())];
        }

        DnaStrand::new(bases)
    }
}

impl Default for DatasetGenerator {
    fn default() -> Self {
        Self::new()
    }
}
