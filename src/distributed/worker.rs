//! Distributed worker
//!
//! A worker holds one partition of the dataset for the whole run:
//!
//! ```text
//! AwaitHello ──HELLO──> AwaitPartition ──PARTITION──> Serving ──CENTROIDS──> Serving
//!                                                          │
//!                                                          └──COMPLETED──> Done
//! ```
//!
//! HELLO is answered with READY once the protocol version and observation kind
//! match; otherwise with ERROR.
//!
//! For every CENTROIDS message it assigns each observation of its partition to
//! the nearest centroid and answers with an ASSIGNMENT_RESULT in the encoding
//! the coordinator asked for. Anything it cannot handle is reported back with
//! an ERROR message before the worker gives up.

use super::protocol::*;
use super::transport::Transport;
use super::Runnable;
use crate::cluster::{assign, group_by_nearest, ClusterError};
use crate::observation::Observation;
use anyhow::Result;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// Summary of a finished worker session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Worker identifier (node name and worker index)
    pub worker_id: String,
    /// Number of CENTROIDS rounds answered
    pub rounds_served: usize,
    /// Observations in the worker's partition
    pub partition_len: usize,
}

/// Distributed worker bound to one coordinator link
pub struct Worker<O, T> {
    link: T,
    node_id: String,
    _observation: PhantomData<fn() -> O>,
}

impl<O: Observation, T: Transport<O>> Worker<O, T> {
    /// Create a worker named after the local host
    pub fn new(link: T) -> Self {
        Self {
            link,
            node_id: local_node_id(),
            _observation: PhantomData,
        }
    }

    /// Override the node name used in worker identifiers
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = node_id.into();
        self
    }

    /// Send an ERROR to the coordinator, then fail with the same description
    async fn fail(
        &mut self,
        worker_id: &str,
        round: usize,
        error: String,
    ) -> Result<WorkerSummary> {
        let msg = Message::Error(ErrorMessage {
            worker_id: worker_id.to_string(),
            error: error.clone(),
            round,
        });

        if let Err(e) = self.link.send(&msg).await {
            warn!(worker_id, error = %e, "could not report failure to coordinator");
        }

        anyhow::bail!("Worker {} failed in round {}: {}", worker_id, round, error)
    }
}

impl<O: Observation, T: Transport<O>> Runnable for Worker<O, T> {
    type Output = WorkerSummary;

    async fn run(mut self) -> Result<WorkerSummary> {
        let node_id = self.node_id.clone();

        let hello = match self.link.recv().await? {
            Message::Hello(hello) => hello,
            other => {
                let error = format!("Expected HELLO, got {}", other.kind());
                return self.fail(&node_id, 0, error).await;
            }
        };

        let worker_id = format!("{}/{}", node_id, hello.worker_index);

        if hello.protocol_version != PROTOCOL_VERSION {
            let error = format!(
                "Protocol version mismatch: coordinator={}, worker={}",
                hello.protocol_version, PROTOCOL_VERSION
            );
            return self.fail(&worker_id, 0, error).await;
        }

        if hello.kind != O::KIND {
            let error = format!(
                "Observation kind mismatch: coordinator={}, worker={}",
                hello.kind,
                O::KIND
            );
            return self.fail(&worker_id, 0, error).await;
        }

        self.link.send(&Message::Ready).await?;

        let partition = match self.link.recv().await? {
            Message::Partition(partition) => partition,
            other => {
                let error = format!("Expected PARTITION, got {}", other.kind());
                return self.fail(&worker_id, 0, error).await;
            }
        };

        info!(
            worker_id = %worker_id,
            offset = partition.offset,
            observations = partition.observations.len(),
            encoding = ?partition.encoding,
            "received partition"
        );

        let mut rounds_served = 0;

        loop {
            match self.link.recv().await? {
                Message::Centroids(CentroidsMessage { round, centroids }) => {
                    let computed =
                        compute_payload(&partition.observations, &centroids, partition.encoding);
                    let payload = match computed {
                        Ok(payload) => payload,
                        Err(e) => return self.fail(&worker_id, round, e.to_string()).await,
                    };

                    self.link
                        .send(&Message::AssignmentResult(AssignmentMessage { round, payload }))
                        .await?;

                    rounds_served += 1;
                    debug!(worker_id = %worker_id, round, "round served");
                }
                Message::Completed => break,
                other => {
                    let error = format!("Expected CENTROIDS or COMPLETED, got {}", other.kind());
                    return self.fail(&worker_id, rounds_served, error).await;
                }
            }
        }

        info!(worker_id = %worker_id, rounds_served, "worker completed");

        Ok(WorkerSummary {
            worker_id,
            rounds_served,
            partition_len: partition.observations.len(),
        })
    }
}

/// Nearest-centroid result for one partition in the requested encoding
pub fn compute_payload<O: Observation>(
    observations: &[O],
    centroids: &[O],
    encoding: ResultEncoding,
) -> Result<AssignmentPayload<O>, ClusterError> {
    match encoding {
        ResultEncoding::Indices => assign(observations, centroids).map(AssignmentPayload::Indices),
        ResultEncoding::Groups => {
            group_by_nearest(observations, centroids).map(AssignmentPayload::Groups)
        }
    }
}

/// Local node name (hostname, or "unknown")
pub fn local_node_id() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
