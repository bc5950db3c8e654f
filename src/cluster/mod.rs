//! Clustering core
//!
//! Shared building blocks for the sequential engine and the distributed
//! coordinator/worker pair:
//!
//! - nearest-centroid assignment (strict `<`, the first minimum wins)
//! - [`ClusterMap`], the per-round grouping of observations by centroid index
//! - centroid recomputation, which drops empty clusters with a warning
//! - [`TerminationPolicy`], the explicit stop rule for a run
//!
//! # Round
//!
//! ```text
//! centroids ──assign──> ClusterMap ──recompute──> new centroids ──decide──> stop / continue
//! ```
//!
//! A `ClusterMap` is rebuilt from scratch every round; it is never updated
//! incrementally.

pub mod error;
pub mod init;
pub mod sequential;

pub use error::ClusterError;
pub use init::CentroidInitializer;
pub use sequential::SequentialEngine;

use crate::observation::{Observation, ObservationKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Ordered centroids of one round; the index is the cluster identifier
pub type CentroidSet<O> = Vec<O>;

/// Index of the nearest centroid
///
/// Ties keep the earliest centroid in `centroids` order. Returns `None` only
/// when `centroids` is empty.
#[inline]
pub fn nearest_centroid<O: Observation>(observation: &O, centroids: &[O]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, centroid) in centroids.iter().enumerate() {
        let distance = observation.distance(centroid);
        match best {
            Some((_, min_distance)) if !(distance < min_distance) => {}
            _ => best = Some((index, distance)),
        }
    }

    best.map(|(index, _)| index)
}

/// Nearest-centroid index for every observation, in order
pub fn assign<O: Observation>(observations: &[O], centroids: &[O]) -> Result<Vec<usize>, ClusterError> {
    observations
        .iter()
        .map(|obs| nearest_centroid(obs, centroids).ok_or(ClusterError::NoCentroids))
        .collect()
}

/// Observations grouped by nearest centroid, one group per centroid
pub fn group_by_nearest<O: Observation>(observations: &[O], centroids: &[O]) -> Result<Vec<Vec<O>>, ClusterError> {
    let assignments = assign(observations, centroids)?;
    let map = ClusterMap::from_assignments(observations, &assignments, centroids.len())?;
    Ok(map.into_groups())
}

/// `new ⊆ old`, by value equality
///
/// This is the convergence test: no centroid moved to a value that was not
/// already a centroid. Ordering is irrelevant.
pub fn is_contained<O: PartialEq>(new: &[O], old: &[O]) -> bool {
    new.iter().all(|c| old.contains(c))
}

/// Dataset-wide grouping of observations by centroid index
#[derive(Debug, Clone)]
pub struct ClusterMap<O> {
    groups: Vec<Vec<O>>,
}

/// Result of recomputing centroids from a [`ClusterMap`]
#[derive(Debug, Clone)]
pub struct Recomputed<O> {
    /// New centroids, one per non-empty group, in centroid index order
    pub centroids: CentroidSet<O>,
    /// Size of the group each new centroid was computed from
    pub sizes: Vec<usize>,
    /// Number of groups that were empty and dropped
    pub empty_clusters: usize,
}

impl<O: Observation> ClusterMap<O> {
    /// Empty map for `k` centroids
    pub fn new(k: usize) -> Self {
        Self {
            groups: (0..k).map(|_| Vec::new()).collect(),
        }
    }

    /// Build a map from parallel `observations` / `assignments` slices
    pub fn from_assignments(observations: &[O], assignments: &[usize], k: usize) -> Result<Self, ClusterError> {
        if observations.len() != assignments.len() {
            return Err(ClusterError::AssignmentLengthMismatch {
                assignments: assignments.len(),
                observations: observations.len(),
            });
        }

        let mut map = Self::new(k);
        for (obs, &index) in observations.iter().zip(assignments) {
            map.insert(index, obs.clone())?;
        }
        Ok(map)
    }

    /// Add one observation to the group of centroid `index`
    pub fn insert(&mut self, index: usize, observation: O) -> Result<(), ClusterError> {
        let k = self.groups.len();
        self.groups
            .get_mut(index)
            .ok_or(ClusterError::CentroidIndexOutOfRange { index, k })?
            .push(observation);
        Ok(())
    }

    /// Append a partial group (e.g. one worker's share) to centroid `index`
    pub fn extend_group<I>(&mut self, index: usize, observations: I) -> Result<(), ClusterError>
    where
        I: IntoIterator<Item = O>,
    {
        let k = self.groups.len();
        self.groups
            .get_mut(index)
            .ok_or(ClusterError::CentroidIndexOutOfRange { index, k })?
            .extend(observations);
        Ok(())
    }

    /// Number of centroids this map was built for
    pub fn num_centroids(&self) -> usize {
        self.groups.len()
    }

    /// Group size per centroid index (including empty groups)
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Vec::len).collect()
    }

    /// Total number of observations in the map
    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn group(&self, index: usize) -> Option<&[O]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    pub fn into_groups(self) -> Vec<Vec<O>> {
        self.groups
    }

    /// Aggregate every non-empty group into a new centroid
    ///
    /// Empty groups are skipped and logged, so the returned set may hold fewer
    /// centroids than the map had groups.
    pub fn recompute(&self) -> Recomputed<O> {
        let mut centroids = Vec::with_capacity(self.groups.len());
        let mut sizes = Vec::with_capacity(self.groups.len());
        let mut empty_clusters = 0;

        for (index, group) in self.groups.iter().enumerate() {
            match O::aggregate(group) {
                Some(centroid) => {
                    centroids.push(centroid);
                    sizes.push(group.len());
                }
                None => {
                    empty_clusters += 1;
                    warn!(
                        cluster = index,
                        "centroid has no observations assigned; the run may end with fewer clusters than requested"
                    );
                }
            }
        }

        Recomputed {
            centroids,
            sizes,
            empty_clusters,
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// New centroid set was contained in the previous one
    Converged,
    /// Round budget used up
    RoundLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Converged => write!(f, "converged"),
            StopReason::RoundLimit => write!(f, "round limit reached"),
        }
    }
}

/// Termination policy
///
/// - `FixedRounds`: run exactly `rounds` rounds regardless of movement
///   (default for DNA strands, 100 rounds)
/// - `Converged`: stop once the new centroid set is contained in the old one
///   (default for points), with `max_rounds` as a safety bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TerminationPolicy {
    FixedRounds { rounds: usize },
    Converged { max_rounds: usize },
}

impl TerminationPolicy {
    pub const DEFAULT_FIXED_ROUNDS: usize = 100;
    pub const DEFAULT_MAX_ROUNDS: usize = 10_000;

    /// Documented default policy per observation kind
    pub fn default_for(kind: ObservationKind) -> Self {
        match kind {
            ObservationKind::Dna => TerminationPolicy::FixedRounds {
                rounds: Self::DEFAULT_FIXED_ROUNDS,
            },
            ObservationKind::Point => TerminationPolicy::Converged {
                max_rounds: Self::DEFAULT_MAX_ROUNDS,
            },
        }
    }

    /// Upper bound on the number of rounds
    pub fn max_rounds(&self) -> usize {
        match *self {
            TerminationPolicy::FixedRounds { rounds } => rounds,
            TerminationPolicy::Converged { max_rounds } => max_rounds,
        }
    }

    /// Decide after round `round` (1-based) whether the run stops
    pub fn decide<O: PartialEq>(&self, round: usize, old: &[O], new: &[O]) -> Option<StopReason> {
        match *self {
            TerminationPolicy::FixedRounds { rounds } => {
                (round >= rounds).then_some(StopReason::RoundLimit)
            }
            TerminationPolicy::Converged { max_rounds } => {
                if is_contained(new, old) {
                    Some(StopReason::Converged)
                } else if round >= max_rounds {
                    Some(StopReason::RoundLimit)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationPolicy::FixedRounds { rounds } => write!(f, "fixed {} rounds", rounds),
            TerminationPolicy::Converged { max_rounds } => {
                write!(f, "until converged (at most {} rounds)", max_rounds)
            }
        }
    }
}

/// Parameters shared by the sequential engine and the coordinator
#[derive(Debug, Clone)]
pub struct ClusteringSettings {
    /// Requested number of clusters
    pub k: usize,
    pub policy: TerminationPolicy,
    /// RNG seed for centroid initialization (entropy when `None`)
    pub seed: Option<u64>,
    /// Resampling draws per centroid before sampling among unused values directly
    pub resample_limit: usize,
}

impl ClusteringSettings {
    pub fn new(k: usize, policy: TerminationPolicy) -> Self {
        Self {
            k,
            policy,
            seed: None,
            resample_limit: CentroidInitializer::DEFAULT_RESAMPLE_LIMIT,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Final result of a clustering run
#[derive(Debug, Clone)]
pub struct ClusteringOutcome<O> {
    /// Final centroids
    pub centroids: CentroidSet<O>,
    /// Number of observations behind each final centroid
    pub cluster_sizes: Vec<usize>,
    /// Rounds executed
    pub rounds: usize,
    pub stop_reason: StopReason,
    /// Wall-clock time since the run context was created
    pub elapsed: Duration,
}
