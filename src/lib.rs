//! kcluster - k-means clustering of 2-D points and DNA strands
//!
//! kcluster partitions a dataset of observations into k clusters by iterative
//! refinement, either in a single process or across a coordinator and a set of
//! workers exchanging messages.
//!
//! # Architecture
//!
//! - **Observations**: 2-D points and DNA strands behind one `Observation` trait
//! - **Clustering core**: initialization, nearest-centroid assignment, centroid
//!   recomputation and explicit termination policies
//! - **Sequential engine**: the whole run in one process
//! - **Distributed mode**: coordinator/worker roles over a pluggable transport
//!   (TCP between processes, channels in-process)
//! - **Datasets**: CSV reading/writing and synthetic data generation

pub mod cluster;
pub mod config;
pub mod dataset;
pub mod distributed;
pub mod observation;
pub mod output;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use observation::{Observation, ObservationKind};

/// Result type used throughout kcluster
pub type Result<T> = anyhow::Result<T>;
