//! Dataset files
//!
//! A dataset file is plain text with one observation per line, in the
//! observation's own CSV form (`x,y` for points, `A,C,G,T,...` for strands).
//! Blank lines are skipped. Every observation in a file must have the same
//! dimension.

pub mod generator;

use crate::observation::Observation;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Read every observation from `path`
///
/// Parse failures report the file and 1-based line number.
pub fn read_dataset<O: Observation>(path: &Path) -> Result<Vec<O>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;

    let mut observations: Vec<O> = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let observation: O = line.parse().with_context(|| {
            format!("{}:{}: invalid {} observation", path.display(), index + 1, O::KIND)
        })?;

        if let Some(first) = observations.first() {
            if observation.dimension() != first.dimension() {
                anyhow::bail!(
                    "{}:{}: dimension {} does not match dimension {} of the first observation",
                    path.display(),
                    index + 1,
                    observation.dimension(),
                    first.dimension()
                );
            }
        }

        observations.push(observation);
    }

    Ok(observations)
}

/// Write observations to `path`, one per line
///
/// Missing parent directories are created.
pub fn write_dataset<O: Observation>(path: &Path, observations: &[O]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create dataset file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for observation in observations {
        writeln!(writer, "{}", observation)
            .with_context(|| format!("Failed to write dataset file: {}", path.display()))?;
    }

    writer.flush()
        .with_context(|| format!("Failed to flush dataset file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{DnaStrand, Point};
    use tempfile::TempDir;

    #[test]
    fn test_read_points_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cluster.csv");
        std::fs::write(&path, "0,0\n\n 1.5,2 \n-3,4\n\n").unwrap();

        let points: Vec<Point> = read_dataset(&path).unwrap();
        assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(1.5, 2.0), Point::new(-3.0, 4.0)]);
    }

    #[test]
    fn test_read_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cluster.csv");
        std::fs::write(&path, "A,C\nA,X\n").unwrap();

        let err = read_dataset::<DnaStrand>(&path).unwrap_err();
        assert!(format!("{}", err).contains(":2:"), "{}", err);
    }

    #[test]
    fn test_read_rejects_mixed_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cluster.csv");
        std::fs::write(&path, "A,C,G\nA,C\n").unwrap();

        let err = read_dataset::<DnaStrand>(&path).unwrap_err();
        assert!(format!("{}", err).contains("dimension 2"), "{}", err);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_dataset::<Point>(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_write_then_read_strands() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("DNA_DataGenerator").join("cluster.csv");
        let strands: Vec<DnaStrand> = ["A,C,G,T", "T,T,G,A"].iter().map(|s| s.parse().unwrap()).collect();

        write_dataset(&path, &strands).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A,C,G,T\nT,T,G,A\n");
        assert_eq!(read_dataset::<DnaStrand>(&path).unwrap(), strands);
    }
}
