//! DNA strand observation
//!
//! A strand is a fixed-length sequence of bases. Distance is the Hamming
//! distance (number of mismatched positions) and the centroid of a group is the
//! per-position majority base. Ties go to the base that comes first in
//! [`DnaBase::ALL`].

use super::{Observation, ObservationKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single DNA base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DnaBase {
    A,
    C,
    G,
    T,
}

impl DnaBase {
    /// Enumeration order, used for majority tie-breaks
    pub const ALL: [DnaBase; 4] = [DnaBase::A, DnaBase::C, DnaBase::G, DnaBase::T];

    #[inline]
    fn index(self) -> usize {
        match self {
            DnaBase::A => 0,
            DnaBase::C => 1,
            DnaBase::G => 2,
            DnaBase::T => 3,
        }
    }
}

impl FromStr for DnaBase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "A" => Ok(DnaBase::A),
            "C" => Ok(DnaBase::C),
            "G" => Ok(DnaBase::G),
            "T" => Ok(DnaBase::T),
            other => anyhow::bail!("Invalid DNA base '{}' (expected A, C, G or T)", other),
        }
    }
}

impl fmt::Display for DnaBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            DnaBase::A => "A",
            DnaBase::C => "C",
            DnaBase::G => "G",
            DnaBase::T => "T",
        };
        f.write_str(c)
    }
}

/// A DNA strand
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnaStrand {
    bases: Vec<DnaBase>,
}

impl DnaStrand {
    pub fn new(bases: Vec<DnaBase>) -> Self {
        Self { bases }
    }

    pub fn bases(&self) -> &[DnaBase] {
        &self.bases
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

impl Observation for DnaStrand {
    const KIND: ObservationKind = ObservationKind::Dna;

    /// Hamming distance
    ///
    /// Strands of different length count every position past the shorter one
    /// as a mismatch. Datasets are checked for a uniform length on load, so
    /// this only matters for hand-built values.
    fn distance(&self, other: &Self) -> f64 {
        let mismatched = self.bases.iter()
            .zip(other.bases.iter())
            .filter(|(a, b)| a != b)
            .count();
        let extra = self.bases.len().abs_diff(other.bases.len());

        (mismatched + extra) as f64
    }

    fn aggregate(group: &[Self]) -> Option<Self> {
        let first = group.first()?;
        let len = first.len();

        let bases = (0..len)
            .map(|position| {
                let mut counts = [0usize; 4];
                for strand in group {
                    if let Some(base) = strand.bases.get(position) {
                        counts[base.index()] += 1;
                    }
                }
                majority(&counts)
            })
            .collect();

        Some(DnaStrand::new(bases))
    }

    fn dimension(&self) -> usize {
        self.bases.len()
    }
}

/// First base in enumeration order with the highest count
fn majority(counts: &[usize; 4]) -> DnaBase {
    let mut best = DnaBase::ALL[0];
    let mut best_count = counts[0];

    for base in &DnaBase::ALL[1..] {
        if counts[base.index()] > best_count {
            best = *base;
            best_count = counts[base.index()];
        }
    }

    best
}

impl FromStr for DnaStrand {
    type Err = anyhow::Error;

    /// Parse `A,C,G,T,...`
    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.trim().is_empty() {
            anyhow::bail!("Empty DNA strand");
        }

        let bases = s.split(',')
            .map(str::parse)
            .collect::<anyhow::Result<Vec<DnaBase>>>()?;

        Ok(DnaStrand::new(bases))
    }
}

impl fmt::Display for DnaStrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, base) in self.bases.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", base)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strand(s: &str) -> DnaStrand {
        s.parse().unwrap()
    }

    #[test]
    fn test_hamming_distance() {
        let a = strand("A,C,G,T");
        let b = strand("A,G,G,A");

        assert_eq!(a.distance(&b), 2.0);
        assert_eq!(b.distance(&a), 2.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_distance_length_mismatch() {
        let a = strand("A,C");
        let b = strand("A,C,G");
        assert_eq!(a.distance(&b), 1.0);
        assert_eq!(b.distance(&a), 1.0);
    }

    #[test]
    fn test_majority_vote() {
        let group = vec![strand("A,A"), strand("A,A"), strand("T,T")];
        assert_eq!(DnaStrand::aggregate(&group), Some(strand("A,A")));
    }

    #[test]
    fn test_majority_tie_prefers_enumeration_order() {
        // Position 0: one T, one G -> G comes first
        // Position 1: one C, one A -> A comes first
        let group = vec![strand("T,C"), strand("G,A")];
        assert_eq!(DnaStrand::aggregate(&group), Some(strand("G,A")));
    }

    #[test]
    fn test_aggregate_identical_group() {
        let s = strand("G,A,T,T,C");
        assert_eq!(DnaStrand::aggregate(&[s.clone(), s.clone()]), Some(s));
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(DnaStrand::aggregate(&[]), None);
    }

    #[test]
    fn test_parse_and_display() {
        let s = strand("A, C,G ,T");
        assert_eq!(s.len(), 4);
        assert_eq!(s.to_string(), "A,C,G,T");
        assert_eq!(s.dimension(), 4);
    }

    #[test]
    fn test_parse_rejects_bad_bases() {
        assert!("A,X,G".parse::<DnaStrand>().is_err());
        assert!("A,,G".parse::<DnaStrand>().is_err());
        assert!("".parse::<DnaStrand>().is_err());
    }
}
