//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_clustering(&config.clustering)?;
    validate_distributed(&config.distributed)?;
    validate_generate(&config.generate)?;

    Ok(())
}

/// Validate clustering configuration
pub fn validate_clustering(clustering: &ClusteringConfig) -> Result<()> {
    if clustering.k == 0 {
        anyhow::bail!("k must be at least 1");
    }

    if clustering.policy().max_rounds() == 0 {
        anyhow::bail!("termination policy must allow at least 1 round");
    }

    if clustering.max_init_attempts == 0 {
        anyhow::bail!("max_init_attempts must be at least 1");
    }

    Ok(())
}

/// Validate parallel mode configuration
pub fn validate_distributed(distributed: &DistributedConfig) -> Result<()> {
    if distributed.workers == Some(0) {
        anyhow::bail!("workers must be at least 1");
    }

    for host in &distributed.hosts {
        if host.trim().is_empty() {
            anyhow::bail!("worker address must not be empty");
        }
    }

    Ok(())
}

/// Validate generate mode configuration
pub fn validate_generate(generate: &GenerateConfig) -> Result<()> {
    if generate.clusters == 0 || generate.per_cluster == 0 {
        anyhow::bail!(
            "generate needs at least 1 cluster of at least 1 observation, got {} x {}",
            generate.clusters,
            generate.per_cluster
        );
    }

    if generate.strand_length == 0 {
        anyhow::bail!("strand_length must be at least 1");
    }

    if !(generate.spread >= 0.0) || !generate.spread.is_finite() {
        anyhow::bail!("spread must be a finite non-negative number, got {}", generate.spread);
    }

    if !(generate.extent > 0.0) || !generate.extent.is_finite() {
        anyhow::bail!("extent must be a finite positive number, got {}", generate.extent);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_clustering() {
        let mut clustering = ClusteringConfig::default();
        assert!(validate_clustering(&clustering).is_ok());

        clustering.k = 0;
        assert!(validate_clustering(&clustering).is_err());

        clustering.k = 3;
        clustering.termination = Some(TerminationPolicy::FixedRounds { rounds: 0 });
        assert!(validate_clustering(&clustering).is_err());

        clustering.termination = Some(TerminationPolicy::Converged { max_rounds: 0 });
        assert!(validate_clustering(&clustering).is_err());

        clustering.termination = None;
        clustering.max_init_attempts = 0;
        assert!(validate_clustering(&clustering).is_err());
    }

    #[test]
    fn test_validate_distributed() {
        let mut distributed = DistributedConfig::default();
        assert!(validate_distributed(&distributed).is_ok());

        distributed.workers = Some(0);
        assert!(validate_distributed(&distributed).is_err());

        distributed.workers = Some(2);
        distributed.hosts = vec!["  ".to_string()];
        assert!(validate_distributed(&distributed).is_err());
    }

    #[test]
    fn test_validate_generate() {
        let mut generate = GenerateConfig::default();
        assert!(validate_generate(&generate).is_ok());

        generate.spread = -1.0;
        assert!(validate_generate(&generate).is_err());

        generate.spread = 1.0;
        generate.per_cluster = 0;
        assert!(validate_generate(&generate).is_err());
    }
}
