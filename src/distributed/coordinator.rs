//! Distributed coordinator
//!
//! The coordinator owns the dataset and drives the run:
//! - Checks protocol version and observation kind with every worker
//! - Partitions the dataset once and ships each worker its share
//! - Broadcasts the centroid set at the start of every round
//! - Merges the workers' assignment results into one [`ClusterMap`]
//! - Recomputes centroids and applies the termination policy
//! - Tells every worker the run is complete
//!
//! Every reply is checked against the round it answers and the partition it
//! covers. A transport failure, an ERROR from a worker, or a reply that does not
//! fit aborts the whole run; no partial result is returned.

use super::partition::partition_ranges;
use super::protocol::*;
use super::transport::Transport;
use super::Runnable;
use crate::cluster::{
    CentroidInitializer, CentroidSet, ClusterError, ClusterMap, ClusteringOutcome,
    ClusteringSettings, Recomputed,
};
use crate::observation::Observation;
use crate::util::RunContext;
use anyhow::{Context, Result};
use std::ops::Range;
use tracing::{debug, info};

/// Distributed coordinator
///
/// Orchestrates one clustering run across a fixed set of worker links.
pub struct Coordinator<O, T> {
    /// Full dataset
    dataset: Vec<O>,

    /// One link per worker; the position is the worker index
    links: Vec<T>,

    settings: ClusteringSettings,

    /// Result encoding requested from workers
    encoding: ResultEncoding,

    /// Caller-supplied starting centroids (random selection when `None`)
    initial: Option<CentroidSet<O>>,

    ctx: RunContext,
}

impl<O: Observation, T: Transport<O>> Coordinator<O, T> {
    /// Create a new coordinator
    pub fn new(
        dataset: Vec<O>,
        links: Vec<T>,
        settings: ClusteringSettings,
        encoding: ResultEncoding,
        ctx: RunContext,
    ) -> Result<Self> {
        if links.is_empty() {
            anyhow::bail!("No workers specified for distributed mode");
        }
        if dataset.is_empty() {
            return Err(ClusterError::EmptyDataset.into());
        }

        Ok(Self {
            dataset,
            links,
            settings,
            encoding,
            initial: None,
            ctx,
        })
    }

    /// Start from the given centroids instead of a random selection
    ///
    /// Useful for reproducible tests and for comparing against the sequential engine.
    pub fn with_initial_centroids(mut self, centroids: CentroidSet<O>) -> Self {
        self.initial = Some(centroids);
        self
    }

    pub fn num_workers(&self) -> usize {
        self.links.len()
    }

    /// Handshake with every worker, then send each its partition
    ///
    /// All handshakes complete before the first partition goes out, so a worker
    /// started for the wrong observation kind is reported before any typed
    /// message is on the wire.
    async fn distribute(&mut self, ranges: &[Range<usize>]) -> Result<()> {
        for (worker_index, link) in self.links.iter_mut().enumerate() {
            let hello = Message::Hello(HelloMessage {
                protocol_version: PROTOCOL_VERSION,
                kind: O::KIND,
                worker_index,
            });

            link.send(&hello)
                .await
                .with_context(|| format!("Failed to send handshake to worker {}", worker_index))?;

            let reply = link.recv().await.with_context(|| {
                format!("Failed to receive handshake reply from worker {}", worker_index)
            })?;

            match reply {
                Message::Ready => {}
                Message::Error(err) => anyhow::bail!(
                    "Worker {} ({}) rejected handshake: {}",
                    worker_index,
                    link.peer(),
                    err.error
                ),
                other => anyhow::bail!(
                    "Worker {} ({}) answered handshake with {}, expected READY",
                    worker_index,
                    link.peer(),
                    other.kind()
                ),
            }
        }

        for (worker_index, (link, range)) in self.links.iter_mut().zip(ranges).enumerate() {
            let msg = Message::Partition(PartitionMessage {
                offset: range.start,
                observations: self.dataset[range.clone()].to_vec(),
                encoding: self.encoding,
            });

            link.send(&msg)
                .await
                .with_context(|| format!("Failed to send partition to worker {}", worker_index))?;

            debug!(
                worker_index,
                peer = link.peer(),
                offset = range.start,
                len = range.len(),
                "partition sent"
            );
        }

        Ok(())
    }

    /// One distributed round: broadcast centroids, then gather every result
    async fn round(
        &mut self,
        round: usize,
        centroids: &CentroidSet<O>,
        ranges: &[Range<usize>],
    ) -> Result<ClusterMap<O>> {
        let msg = Message::Centroids(CentroidsMessage {
            round,
            centroids: centroids.clone(),
        });

        // All sends go out before the first receive so workers compute concurrently
        for (worker_index, link) in self.links.iter_mut().enumerate() {
            link.send(&msg).await.with_context(|| {
                format!("Failed to send centroids to worker {} in round {}", worker_index, round)
            })?;
        }

        let mut map = ClusterMap::new(centroids.len());

        for (worker_index, (link, range)) in self.links.iter_mut().zip(ranges).enumerate() {
            let reply = link.recv().await.with_context(|| {
                format!("Failed to receive result from worker {} in round {}", worker_index, round)
            })?;

            merge_reply(&mut map, &self.dataset[range.clone()], round, reply).with_context(|| {
                format!("Invalid reply from worker {} ({})", worker_index, link.peer())
            })?;
        }

        Ok(map)
    }
}

impl<O: Observation, T: Transport<O>> Runnable for Coordinator<O, T> {
    type Output = ClusteringOutcome<O>;

    async fn run(mut self) -> Result<ClusteringOutcome<O>> {
        let initial = match self.initial.take() {
            Some(centroids) if centroids.is_empty() => return Err(ClusterError::NoCentroids.into()),
            Some(centroids) => centroids,
            None => CentroidInitializer::from_settings(&self.settings)
                .select(&self.dataset, self.settings.k)?,
        };

        let ranges = partition_ranges(self.dataset.len(), self.links.len());
        let policy = self.settings.policy;

        info!(
            observations = self.dataset.len(),
            workers = self.links.len(),
            k = initial.len(),
            %policy,
            encoding = ?self.encoding,
            "starting distributed clustering"
        );

        self.distribute(&ranges).await?;

        let mut centroids = initial;
        let mut round = 0;

        let (stop_reason, sizes) = loop {
            round += 1;

            let map = self.round(round, &centroids, &ranges).await?;
            let Recomputed { centroids: next, sizes, empty_clusters } = map.recompute();

            debug!(round, clusters = next.len(), empty_clusters, "round complete");

            let decision = policy.decide(round, &centroids, &next);
            centroids = next;

            if let Some(stop_reason) = decision {
                break (stop_reason, sizes);
            }
        };

        for (worker_index, link) in self.links.iter_mut().enumerate() {
            link.send(&Message::Completed).await
                .with_context(|| format!("Failed to send completion to worker {}", worker_index))?;
        }

        info!(rounds = round, %stop_reason, "distributed clustering finished");

        Ok(ClusteringOutcome {
            centroids,
            cluster_sizes: sizes,
            rounds: round,
            stop_reason,
            elapsed: self.ctx.elapsed(),
        })
    }
}

/// Validate one worker reply and merge it into `map`
///
/// `partition` is the slice of the dataset the worker was given; index results
/// are mapped back through it, so the merged map keeps dataset order.
fn merge_reply<O: Observation>(
    map: &mut ClusterMap<O>,
    partition: &[O],
    round: usize,
    reply: Message<O>,
) -> Result<()> {
    let result = match reply {
        Message::AssignmentResult(result) => result,
        Message::Error(err) => anyhow::bail!(
            "Worker {} reported error in round {}: {}",
            err.worker_id,
            err.round,
            err.error
        ),
        other => anyhow::bail!("Expected ASSIGNMENT_RESULT, got {}", other.kind()),
    };

    if result.round != round {
        anyhow::bail!("Result answers round {} but round {} is in progress", result.round, round);
    }

    let covered = result.payload.observation_count();
    if covered != partition.len() {
        anyhow::bail!(
            "Result covers {} observations but the partition holds {}",
            covered,
            partition.len()
        );
    }

    match result.payload {
        AssignmentPayload::Indices(indices) => {
            for (observation, index) in partition.iter().zip(indices) {
                map.insert(index, observation.clone())?;
            }
        }
        AssignmentPayload::Groups(groups) => {
            for (index, group) in groups.into_iter().enumerate() {
                map.extend_group(index, group)?;
            }
        }
    }

    Ok(())
}
