//! Clustering errors

use thiserror::Error;

/// Typed failures of the clustering core
///
/// Empty clusters are not represented here; recomputation drops them with a
/// warning and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("number of clusters must be at least 1")]
    ZeroClusters,

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("number of clusters ({k}) exceeds dataset size ({size})")]
    TooManyClusters { k: usize, size: usize },

    #[error("dataset has only {distinct} distinct observations, cannot pick {k} distinct centroids")]
    InsufficientDistinct { k: usize, distinct: usize },

    #[error("no centroids to assign observations to")]
    NoCentroids,

    #[error("centroid index {index} out of range for {k} centroids")]
    CentroidIndexOutOfRange { index: usize, k: usize },

    #[error("{assignments} assignments for {observations} observations")]
    AssignmentLengthMismatch { assignments: usize, observations: usize },
}
