//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::cluster::{CentroidInitializer, ClusteringSettings, TerminationPolicy};
use crate::dataset::generator::{DatasetGenerator, PointClusters, StrandClusters};
use crate::distributed::ResultEncoding;
use crate::observation::ObservationKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub distributed: DistributedConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// Clustering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Number of clusters
    #[serde(default = "default_k")]
    pub k: usize,
    /// Observation kind (point or dna)
    #[serde(default = "default_kind")]
    pub kind: ObservationKind,
    /// Termination policy (per-kind default when unset)
    pub termination: Option<TerminationPolicy>,
    /// Worker result encoding (per-kind default when unset)
    pub encoding: Option<ResultEncoding>,
    /// RNG seed for centroid initialization
    pub seed: Option<u64>,
    /// Resampling draws per centroid before sampling among unused values directly
    #[serde(default = "default_max_init_attempts")]
    pub max_init_attempts: usize,
}

fn default_k() -> usize {
    2
}

fn default_kind() -> ObservationKind {
    ObservationKind::Point
}

fn default_max_init_attempts() -> usize {
    CentroidInitializer::DEFAULT_RESAMPLE_LIMIT
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            kind: default_kind(),
            termination: None,
            encoding: None,
            seed: None,
            max_init_attempts: default_max_init_attempts(),
        }
    }
}

impl ClusteringConfig {
    /// Effective termination policy
    pub fn policy(&self) -> TerminationPolicy {
        self.termination
            .unwrap_or_else(|| TerminationPolicy::default_for(self.kind))
    }

    /// Effective worker result encoding
    pub fn encoding(&self) -> ResultEncoding {
        self.encoding
            .unwrap_or_else(|| ResultEncoding::default_for(self.kind))
    }

    /// Engine settings for this configuration
    pub fn settings(&self) -> ClusteringSettings {
        let mut settings = ClusteringSettings::new(self.k, self.policy());
        settings.seed = self.seed;
        settings.resample_limit = self.max_init_attempts;
        settings
    }
}

/// Dataset location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Dataset file (per-kind default when unset)
    pub path: Option<PathBuf>,
}

impl InputConfig {
    /// Effective dataset path for `kind`
    pub fn path_for(&self, kind: ObservationKind) -> PathBuf {
        self.path.clone().unwrap_or_else(|| default_dataset_path(kind))
    }
}

/// Default dataset file per observation kind
pub fn default_dataset_path(kind: ObservationKind) -> PathBuf {
    match kind {
        ObservationKind::Dna => PathBuf::from("DNA_DataGenerator/cluster.csv"),
        ObservationKind::Point => PathBuf::from("2D_DataGenerator/cluster.csv"),
    }
}

/// Parallel mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedConfig {
    /// Localhost workers to launch when no hosts are given (CPU count when unset)
    pub workers: Option<usize>,
    /// Worker addresses (host or host:port)
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Port used for hosts given without one
    #[serde(default = "default_port")]
    pub worker_port: u16,
    /// Port a worker listens on
    #[serde(default = "default_port")]
    pub listen_port: u16,
    /// Keep a worker serving after its first coordinator
    #[serde(default)]
    pub persistent: bool,
}

fn default_port() -> u16 {
    9999
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            workers: None,
            hosts: Vec::new(),
            worker_port: default_port(),
            listen_port: default_port(),
            persistent: false,
        }
    }
}

impl DistributedConfig {
    /// Number of localhost workers to launch
    pub fn local_workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Worker addresses with the default port filled in
    pub fn addresses(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| host.trim())
            .filter(|host| !host.is_empty())
            .map(|host| {
                if host.contains(':') {
                    host.to_string()
                } else {
                    format!("{}:{}", host, self.worker_port)
                }
            })
            .collect()
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON report file
    pub json_output: Option<PathBuf>,
}

/// Synthetic dataset parameters (generate mode)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    /// Observations per cluster
    #[serde(default = "default_per_cluster")]
    pub per_cluster: usize,
    #[serde(default = "default_strand_length")]
    pub strand_length: usize,
    #[serde(default = "default_extent")]
    pub extent: f64,
    #[serde(default = "default_min_separation")]
    pub min_separation: f64,
    #[serde(default = "default_spread")]
    pub spread: f64,
    /// RNG seed (entropy when unset)
    pub seed: Option<u64>,
}

fn default_clusters() -> usize {
    3
}

fn default_per_cluster() -> usize {
    100
}

fn default_strand_length() -> usize {
    20
}

fn default_extent() -> f64 {
    1000.0
}

fn default_min_separation() -> f64 {
    150.0
}

fn default_spread() -> f64 {
    15.0
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            clusters: default_clusters(),
            per_cluster: default_per_cluster(),
            strand_length: default_strand_length(),
            extent: default_extent(),
            min_separation: default_min_separation(),
            spread: default_spread(),
            seed: None,
        }
    }
}

impl GenerateConfig {
    pub fn generator(&self) -> DatasetGenerator {
        match self.seed {
            Some(seed) => DatasetGenerator::with_seed(seed),
            None => DatasetGenerator::new(),
        }
    }

    pub fn strand_clusters(&self) -> StrandClusters {
        StrandClusters {
            clusters: self.clusters,
            strands_per_cluster: self.per_cluster,
            strand_length: self.strand_length,
        }
    }

    pub fn point_clusters(&self) -> PointClusters {
        PointClusters {
            clusters: self.clusters,
            points_per_cluster: self.per_cluster,
            extent: self.extent,
            min_separation: self.min_separation,
            spread: self.spread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_kind_defaults() {
        let mut clustering = ClusteringConfig::default();
        assert_eq!(clustering.encoding(), ResultEncoding::Groups);
        assert!(matches!(clustering.policy(), TerminationPolicy::Converged { .. }));

        clustering.kind = ObservationKind::Dna;
        assert_eq!(clustering.encoding(), ResultEncoding::Indices);
        assert_eq!(clustering.policy(), TerminationPolicy::FixedRounds { rounds: 100 });

        let input = InputConfig::default();
        assert_eq!(input.path_for(ObservationKind::Dna), PathBuf::from("DNA_DataGenerator/cluster.csv"));
        assert_eq!(input.path_for(ObservationKind::Point), PathBuf::from("2D_DataGenerator/cluster.csv"));
    }

    #[test]
    fn test_explicit_settings_win() {
        let clustering = ClusteringConfig {
            k: 4,
            kind: ObservationKind::Dna,
            termination: Some(TerminationPolicy::Converged { max_rounds: 7 }),
            encoding: Some(ResultEncoding::Groups),
            seed: Some(9),
            max_init_attempts: 12,
        };

        let settings = clustering.settings();
        assert_eq!(settings.k, 4);
        assert_eq!(settings.policy, TerminationPolicy::Converged { max_rounds: 7 });
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.resample_limit, 12);
        assert_eq!(clustering.encoding(), ResultEncoding::Groups);
    }

    #[test]
    fn test_worker_addresses() {
        let distributed = DistributedConfig {
            hosts: vec!["10.0.1.10".to_string(), " 10.0.1.11:7000 ".to_string(), "".to_string()],
            worker_port: 8000,
            ..Default::default()
        };

        assert_eq!(distributed.addresses(), vec!["10.0.1.10:8000", "10.0.1.11:7000"]);
    }
}
