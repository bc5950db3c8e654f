//! Clusterable observations
//!
//! This module defines the contract every clusterable element satisfies and the
//! two concrete kinds kcluster knows about.
//!
//! # Kinds
//!
//! - **Point**: 2-D continuous coordinates, Euclidean distance, mean aggregation
//! - **DnaStrand**: fixed-length strand over {A, C, G, T}, Hamming distance,
//!   per-position majority vote aggregation
//!
//! # Example
//!
//! ```
//! use kcluster::observation::{Observation, point::Point};
//!
//! let group = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];
//! let centroid = Point::aggregate(&group).unwrap();
//! assert_eq!(centroid, Point::new(0.0, 0.5));
//! assert_eq!(group[0].distance(&group[1]), 1.0);
//! ```

pub mod point;
pub mod strand;

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use point::Point;
pub use strand::{DnaBase, DnaStrand};

/// Observation kind
///
/// Selects which concrete [`Observation`] a run operates on. Shared by the
/// configuration, the CLI and the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// 2-D points
    Point,
    /// DNA strands
    Dna,
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationKind::Point => write!(f, "point"),
            ObservationKind::Dna => write!(f, "dna"),
        }
    }
}

/// Capability contract for clusterable elements
///
/// Observations are immutable values. Equality is value equality over all
/// positions or coordinates, which is what centroid initialization and the
/// convergence test rely on.
///
/// `FromStr` and `Display` both use the dataset line format (comma-separated
/// coordinates or bases), so a centroid printed by a run can be read back as
/// an observation.
pub trait Observation:
    Clone
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = anyhow::Error>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Kind tag used to check that coordinator and worker agree on the data
    const KIND: ObservationKind;

    /// Non-negative, symmetric distance; zero iff both observations are equal
    fn distance(&self, other: &Self) -> f64;

    /// Representative of a group of observations
    ///
    /// Returns `None` for an empty group. Callers handle empty clusters
    /// themselves (see [`crate::cluster::ClusterMap::recompute`]).
    fn aggregate(group: &[Self]) -> Option<Self>;

    /// Number of positions or coordinates
    fn dimension(&self) -> usize;
}
