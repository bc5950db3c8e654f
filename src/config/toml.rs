//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the run configuration from the optional config file and the CLI
pub fn build_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };

    merge_cli_with_config(cli, config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Override clustering settings
    if let Some(k) = cli.clusters {
        config.clustering.k = k;
        config.generate.clusters = k;
    }
    if let Some(kind) = cli.kind {
        config.clustering.kind = kind;
    }
    if let Some(encoding) = cli.encoding {
        config.clustering.encoding = Some(encoding);
    }
    if let Some(seed) = cli.seed {
        config.clustering.seed = Some(seed);
        config.generate.seed = Some(seed);
    }
    if let Some(attempts) = cli.max_init_attempts {
        config.clustering.max_init_attempts = attempts;
    }

    // Override termination policy
    if let Some(rounds) = cli.fixed_rounds {
        config.clustering.termination = Some(TerminationPolicy::FixedRounds { rounds });
    } else if cli.converge || cli.max_rounds.is_some() {
        let max_rounds = cli.max_rounds.unwrap_or(match config.clustering.termination {
            Some(TerminationPolicy::Converged { max_rounds }) => max_rounds,
            _ => TerminationPolicy::DEFAULT_MAX_ROUNDS,
        });
        config.clustering.termination = Some(TerminationPolicy::Converged { max_rounds });
    }

    // Override input
    if let Some(ref path) = cli.input {
        config.input.path = Some(path.clone());
    }

    // Override distributed settings
    if let Some(workers) = cli.workers {
        config.distributed.workers = Some(workers);
    }
    if let Some(port) = cli.worker_port {
        config.distributed.worker_port = port;
    }
    if let Some(port) = cli.listen_port {
        config.distributed.listen_port = port;
    }
    if cli.persistent {
        config.distributed.persistent = true;
    }
    if let Some(ref host_list) = cli.host_list {
        config.distributed.hosts = host_list
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect();
    } else if let Some(ref clients_file) = cli.clients_file {
        config.distributed.hosts = parse_clients_file(clients_file)?;
    }

    // Override generate settings
    if let Some(per_cluster) = cli.per_cluster {
        config.generate.per_cluster = per_cluster;
    }
    if let Some(length) = cli.strand_length {
        config.generate.strand_length = length;
    }
    if let Some(spread) = cli.spread {
        config.generate.spread = spread;
    }

    // Override output
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    Ok(config)
}

/// Read worker addresses from a clients file
///
/// One address per line; blank lines and `#` comments are skipped.
pub fn parse_clients_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read clients file: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kcluster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
            [clustering]
            k = 5
            kind = "dna"
            seed = 42

            [input]
            path = "data/strands.csv"
        "#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.clustering.k, 5);
        assert_eq!(config.clustering.kind, ObservationKind::Dna);
        assert_eq!(config.clustering.seed, Some(42));
        assert_eq!(config.input.path, Some(PathBuf::from("data/strands.csv")));
        assert_eq!(config.distributed.worker_port, 9999);
    }

    #[test]
    fn test_parse_toml_termination_and_distributed() {
        let toml = r#"
            [clustering]
            encoding = "indices"

            [clustering.termination]
            policy = "converged"
            max_rounds = 250

            [distributed]
            hosts = ["10.0.1.10", "10.0.1.11:7000"]
            worker_port = 8000

            [output]
            json_output = "report.json"
        "#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.clustering.termination, Some(TerminationPolicy::Converged { max_rounds: 250 }));
        assert_eq!(config.clustering.encoding, Some(ResultEncoding::Indices));
        assert_eq!(config.distributed.addresses(), vec!["10.0.1.10:8000", "10.0.1.11:7000"]);
        assert_eq!(config.output.json_output, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_parse_toml_rejects_unknown_kind() {
        assert!(parse_toml_string("[clustering]\nkind = \"hexagon\"\n").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[clustering]\nk = 5\nkind = \"dna\"\n\n[clustering.termination]\npolicy = \"fixed_rounds\"\nrounds = 10"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = build_config(&cli(&["--config", &path, "-k", "3", "--converge"])).unwrap();

        assert_eq!(config.clustering.k, 3);
        assert_eq!(config.clustering.kind, ObservationKind::Dna);
        assert_eq!(
            config.clustering.termination,
            Some(TerminationPolicy::Converged { max_rounds: TerminationPolicy::DEFAULT_MAX_ROUNDS })
        );
    }

    #[test]
    fn test_fixed_rounds_override() {
        let config = build_config(&cli(&["--fixed-rounds", "12"])).unwrap();
        assert_eq!(config.clustering.policy(), TerminationPolicy::FixedRounds { rounds: 12 });
    }

    #[test]
    fn test_clients_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# workers\n10.0.1.10\n\n10.0.1.11:7000\n").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = build_config(&cli(&["--mode", "parallel", "--clients-file", &path])).unwrap();

        assert_eq!(config.distributed.addresses(), vec!["10.0.1.10:9999", "10.0.1.11:7000"]);
    }

    #[test]
    fn test_host_list_skips_empty_entries() {
        let args = ["--mode", "parallel", "--host-list", "a,,b, ,c:7000,"];
        let config = build_config(&cli(&args)).unwrap();

        assert_eq!(config.distributed.hosts, vec!["a", "b", "c:7000"]);
        assert_eq!(config.distributed.addresses(), vec!["a:9999", "b:9999", "c:7000"]);
        assert!(crate::config::validator::validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(parse_toml_file(Path::new("/nonexistent/kcluster.toml")).is_err());
    }
}
