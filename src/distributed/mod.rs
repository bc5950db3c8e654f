//! Distributed mode implementation
//!
//! This module implements k-means across one coordinator and several workers.
//!
//! # Architecture
//!
//! kcluster parallel mode uses a coordinator-worker architecture:
//!
//! - **Coordinator**: Owns the dataset, partitions it once, drives the rounds and
//!   recomputes centroids from the merged results
//! - **Worker**: Holds one partition and answers each round with the
//!   nearest-centroid assignment of its observations
//!
//! The two sides only share messages; neither reads the other's state.
//!
//! # Modules
//!
//! - `protocol`: Message definitions and serialization
//! - `partition`: Dataset partitioning
//! - `transport`: TCP and in-process message links
//! - `coordinator`: Coordinator state machine
//! - `worker`: Worker state machine
//! - `service`: TCP listener that hosts workers
//! - `launcher`: Worker processes started on localhost

pub mod protocol;
pub mod partition;
pub mod transport;
pub mod coordinator;
pub mod worker;
pub mod service;
pub mod launcher;

use anyhow::Result;
use std::future::Future;

// Re-export key types
pub use protocol::{
    Message,
    PartitionMessage,
    CentroidsMessage,
    AssignmentMessage,
    AssignmentPayload,
    ErrorMessage,
    ResultEncoding,
    PROTOCOL_VERSION,
};

pub use partition::partition_ranges;
pub use transport::{channel_pair, ChannelTransport, TcpTransport, Transport};
pub use coordinator::Coordinator;
pub use worker::{Worker, WorkerSummary};
pub use service::WorkerService;
pub use launcher::{find_available_ports, LocalWorkers};

/// A distributed role that runs to completion
///
/// Implemented by [`Coordinator`] and [`Worker`]; the returned future is `Send`
/// so either role can be spawned on the tokio runtime.
pub trait Runnable {
    type Output;

    fn run(self) -> impl Future<Output = Result<Self::Output>> + Send;
}
