//! CLI argument parsing using clap

use crate::distributed::ResultEncoding;
use crate::observation::ObservationKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Sequential mode (default) - single process clustering
    Sequential,
    /// Parallel mode - coordinate clustering across workers
    Parallel,
    /// Worker mode - serve a coordinator (accepts partitions and centroid rounds)
    Worker,
    /// Generate mode - write a synthetic dataset
    Generate,
}

/// kcluster - k-means clustering of 2-D points and DNA strands
#[derive(Parser, Debug)]
#[command(name = "kcluster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: sequential, parallel, worker, or generate
    #[arg(long, value_enum, default_value = "sequential")]
    pub mode: ExecutionMode,

    /// Number of clusters (also the cluster count in generate mode)
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Observation kind
    #[arg(long, value_enum)]
    pub kind: Option<ObservationKind>,

    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long, env = "KCLUSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dataset file (read in clustering modes, written in generate mode)
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    // === Termination Options ===
    /// Run exactly N rounds
    #[arg(long, conflicts_with = "converge")]
    pub fixed_rounds: Option<usize>,

    /// Run until no centroid moves
    #[arg(long)]
    pub converge: bool,

    /// Round limit when running until convergence
    #[arg(long)]
    pub max_rounds: Option<usize>,

    // === Initialization Options ===
    /// RNG seed for centroid initialization and dataset generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Resampling draws per centroid during initialization
    #[arg(long)]
    pub max_init_attempts: Option<usize>,

    // === Parallel Options ===
    /// Worker result encoding
    #[arg(long, value_enum)]
    pub encoding: Option<ResultEncoding>,

    /// Number of localhost workers to launch (parallel mode without hosts)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Comma-separated list of worker addresses (e.g., "10.0.1.10:9999,10.0.1.11:9999")
    #[arg(long, conflicts_with = "clients_file")]
    pub host_list: Option<String>,

    /// File containing list of worker addresses (one per line)
    #[arg(long)]
    pub clients_file: Option<PathBuf>,

    /// Port to connect to on workers given without one
    #[arg(long)]
    pub worker_port: Option<u16>,

    /// Port for a worker to listen on (worker mode only)
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Keep serving coordinators after the first session (worker mode only)
    #[arg(long)]
    pub persistent: bool,

    // === Generate Options ===
    /// Observations per generated cluster
    #[arg(long)]
    pub per_cluster: Option<usize>,

    /// Generated strand length
    #[arg(long)]
    pub strand_length: Option<usize>,

    /// Standard deviation of generated points around their center
    #[arg(long)]
    pub spread: Option<f64>,

    // === Output Options ===
    /// Write a JSON report to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Log filter (e.g., "info", "kcluster=debug"); RUST_LOG is used when unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Keep launched worker logs in /tmp
    #[arg(long)]
    pub debug: bool,

    /// Validate and print the configuration without running
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.clusters == Some(0) {
            anyhow::bail!("clusters must be at least 1");
        }

        if self.workers == Some(0) {
            anyhow::bail!("workers must be at least 1");
        }

        if self.fixed_rounds == Some(0) || self.max_rounds == Some(0) {
            anyhow::bail!("round counts must be at least 1");
        }

        if self.max_rounds.is_some() && self.fixed_rounds.is_some() {
            anyhow::bail!("--max-rounds applies to --converge, not --fixed-rounds");
        }

        if self.mode != ExecutionMode::Worker && self.persistent {
            anyhow::bail!("--persistent is only valid in worker mode");
        }

        if self.mode != ExecutionMode::Parallel && (self.host_list.is_some() || self.clients_file.is_some()) {
            anyhow::bail!("--host-list and --clients-file are only valid in parallel mode");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kcluster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.mode, ExecutionMode::Sequential);
        assert!(cli.clusters.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parallel_arguments() {
        let cli = parse(&["--mode", "parallel", "-k", "3", "--kind", "dna", "--workers", "4", "--encoding", "groups"]);
        assert_eq!(cli.mode, ExecutionMode::Parallel);
        assert_eq!(cli.clusters, Some(3));
        assert_eq!(cli.kind, Some(ObservationKind::Dna));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.encoding, Some(ResultEncoding::Groups));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(parse(&["-k", "0"]).validate().is_err());
        assert!(parse(&["--workers", "0"]).validate().is_err());
        assert!(parse(&["--fixed-rounds", "0"]).validate().is_err());
    }

    #[test]
    fn test_termination_flags_conflict() {
        let result = Cli::try_parse_from(["kcluster", "--fixed-rounds", "5", "--converge"]);
        assert!(result.is_err());

        assert!(parse(&["--fixed-rounds", "5", "--max-rounds", "9"]).validate().is_err());
    }

    #[test]
    fn test_mode_specific_flags() {
        assert!(parse(&["--persistent"]).validate().is_err());
        assert!(parse(&["--mode", "worker", "--persistent"]).validate().is_ok());
        assert!(parse(&["--host-list", "a,b"]).validate().is_err());
    }
}
