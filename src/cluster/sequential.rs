//! Sequential clustering engine
//!
//! Single-process k-means:
//!
//! ```text
//! Init ──> { AssignRound ──> RecomputeRound }* ──> Terminal
//! ```
//!
//! Every round assigns each observation to its nearest centroid, rebuilds the
//! [`ClusterMap`](super::ClusterMap), recomputes centroids from the non-empty
//! groups and asks the [`TerminationPolicy`](super::TerminationPolicy) whether
//! to stop.

use super::{
    assign, CentroidInitializer, CentroidSet, ClusterError, ClusterMap, ClusteringOutcome,
    ClusteringSettings, Recomputed,
};
use crate::observation::Observation;
use crate::util::RunContext;
use crate::Result;
use tracing::{debug, info};

/// Single-process k-means engine
pub struct SequentialEngine {
    settings: ClusteringSettings,
}

impl SequentialEngine {
    pub fn new(settings: ClusteringSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClusteringSettings {
        &self.settings
    }

    /// Run from randomly selected initial centroids
    pub fn run<O: Observation>(&self, dataset: &[O], ctx: &RunContext) -> Result<ClusteringOutcome<O>> {
        let initial = CentroidInitializer::from_settings(&self.settings)
            .select(dataset, self.settings.k)?;

        self.run_from(dataset, initial, ctx)
    }

    /// Run from caller-supplied initial centroids
    pub fn run_from<O: Observation>(
        &self,
        dataset: &[O],
        initial: CentroidSet<O>,
        ctx: &RunContext,
    ) -> Result<ClusteringOutcome<O>> {
        if dataset.is_empty() {
            return Err(ClusterError::EmptyDataset.into());
        }
        if initial.is_empty() {
            return Err(ClusterError::NoCentroids.into());
        }

        let policy = self.settings.policy;
        info!(
            observations = dataset.len(),
            k = initial.len(),
            %policy,
            "starting sequential clustering"
        );

        let mut centroids = initial;
        let mut round = 0;

        loop {
            round += 1;

            let assignments = assign(dataset, &centroids)?;
            let map = ClusterMap::from_assignments(dataset, &assignments, centroids.len())?;
            let Recomputed { centroids: next, sizes, empty_clusters } = map.recompute();

            debug!(round, clusters = next.len(), empty_clusters, "round complete");

            let decision = policy.decide(round, &centroids, &next);
            centroids = next;

            if let Some(stop_reason) = decision {
                info!(rounds = round, %stop_reason, "sequential clustering finished");
                return Ok(ClusteringOutcome {
                    centroids,
                    cluster_sizes: sizes,
                    rounds: round,
                    stop_reason,
                    elapsed: ctx.elapsed(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{StopReason, TerminationPolicy};
    use crate::observation::{DnaStrand, Point};

    fn converging(k: usize) -> ClusteringSettings {
        ClusteringSettings::new(k, TerminationPolicy::Converged { max_rounds: 100 })
    }

    fn four_points() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 1.0),
        ]
    }

    fn sorted(mut centroids: Vec<Point>) -> Vec<Point> {
        centroids.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        centroids
    }

    #[test]
    fn test_two_blobs_converge_from_split_starts() {
        let data = four_points();
        let engine = SequentialEngine::new(converging(2));

        for left in &data[..2] {
            for right in &data[2..] {
                for initial in [vec![*left, *right], vec![*right, *left]] {
                    let outcome = engine.run_from(&data, initial.clone(), &RunContext::start()).unwrap();

                    assert_eq!(outcome.stop_reason, StopReason::Converged);
                    assert_eq!(
                        sorted(outcome.centroids),
                        vec![Point::new(0.0, 0.5), Point::new(10.0, 0.5)],
                        "initial {:?}",
                        initial
                    );
                    assert_eq!(outcome.cluster_sizes, vec![2, 2]);
                }
            }
        }
    }

    #[test]
    fn test_same_blob_start_settles_on_other_fixed_point() {
        // Both starting centroids on the left: Lloyd iteration settles on the
        // horizontal split instead
        let data = four_points();
        let initial = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];

        let outcome = SequentialEngine::new(converging(2))
            .run_from(&data, initial, &RunContext::start())
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Converged);
        assert_eq!(outcome.centroids, vec![Point::new(5.0, 0.0), Point::new(5.0, 1.0)]);
    }

    #[test]
    fn test_seeded_runs_always_converge() {
        let data = four_points();

        for seed in 0..20 {
            let engine = SequentialEngine::new(converging(2).with_seed(seed));
            let outcome = engine.run(&data, &RunContext::start()).unwrap();

            assert_eq!(outcome.stop_reason, StopReason::Converged, "seed {}", seed);
            assert_eq!(outcome.cluster_sizes, vec![2, 2]);
            assert!(outcome.rounds <= 3);
        }
    }

    #[test]
    fn test_k_equals_dataset_size_converges_in_one_round() {
        let data = four_points();
        let engine = SequentialEngine::new(converging(4).with_seed(11));
        let outcome = engine.run(&data, &RunContext::start()).unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.stop_reason, StopReason::Converged);
        assert_eq!(sorted(outcome.centroids), sorted(data));
        assert_eq!(outcome.cluster_sizes, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_strand_majority_with_single_cluster() {
        let data: Vec<DnaStrand> = ["A,A", "A,A", "T,T"].iter().map(|s| s.parse().unwrap()).collect();
        let settings = ClusteringSettings::new(1, TerminationPolicy::FixedRounds { rounds: 5 }).with_seed(2);
        let outcome = SequentialEngine::new(settings).run(&data, &RunContext::start()).unwrap();

        assert_eq!(outcome.centroids, vec!["A,A".parse::<DnaStrand>().unwrap()]);
        assert_eq!(outcome.rounds, 5);
        assert_eq!(outcome.stop_reason, StopReason::RoundLimit);
        assert_eq!(outcome.cluster_sizes, vec![3]);
    }

    #[test]
    fn test_empty_cluster_shrinks_centroid_set() {
        let data = four_points();
        // The far-away centroid attracts nothing and is dropped after round 1
        let initial = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(500.0, 500.0)];

        let engine = SequentialEngine::new(converging(3));
        let outcome = engine.run_from(&data, initial, &RunContext::start()).unwrap();

        assert_eq!(sorted(outcome.centroids), vec![Point::new(0.0, 0.5), Point::new(10.0, 0.5)]);
    }

    #[test]
    fn test_fixed_point_does_not_move() {
        let data = four_points();
        let optimal = vec![Point::new(0.0, 0.5), Point::new(10.0, 0.5)];

        let engine = SequentialEngine::new(converging(2));
        let outcome = engine.run_from(&data, optimal.clone(), &RunContext::start()).unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.centroids, optimal);
    }

    #[test]
    fn test_round_limit_bounds_converged_policy() {
        let data = four_points();
        let settings = ClusteringSettings::new(2, TerminationPolicy::Converged { max_rounds: 1 });
        let initial = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];

        let outcome = SequentialEngine::new(settings)
            .run_from(&data, initial, &RunContext::start())
            .unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.stop_reason, StopReason::RoundLimit);
    }

    #[test]
    fn test_errors_surface() {
        let engine = SequentialEngine::new(converging(2));
        let ctx = RunContext::start();

        assert!(engine.run::<Point>(&[], &ctx).is_err());
        assert!(engine.run_from(&four_points(), Vec::new(), &ctx).is_err());

        let duplicates = vec![Point::new(1.0, 1.0); 4];
        let err = engine.run(&duplicates, &ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClusterError>(),
            Some(ClusterError::InsufficientDistinct { .. })
        ));
    }
}
