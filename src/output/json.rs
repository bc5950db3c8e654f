//! JSON output formatting
//!
//! A single report per run with the final centroids, their cluster sizes and
//! run metadata (mode, kind, rounds, timing).

use crate::cluster::{ClusteringOutcome, StopReason};
use crate::observation::{Observation, ObservationKind};
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Duration with both nanoseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDuration {
    pub nanos: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            nanos: d.as_nanos() as u64,
            human: crate::util::time::format_duration(d),
        }
    }
}

/// One final cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCluster {
    /// Centroid in dataset CSV form
    pub centroid: String,
    pub size: usize,
}

/// Run metadata that is not part of the clustering outcome
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Execution mode name ("sequential" or "parallel")
    pub mode: String,
    pub kind: ObservationKind,
    /// Requested number of clusters
    pub k: usize,
    pub observations: usize,
    /// Worker count in parallel mode
    pub workers: Option<usize>,
    pub started_at: DateTime<Utc>,
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub tool: String,
    pub version: String,
    /// RFC 3339 start time
    pub started_at: String,
    pub mode: String,
    pub kind: ObservationKind,
    pub requested_k: usize,
    pub observations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub rounds: usize,
    pub stop_reason: StopReason,
    pub elapsed: JsonDuration,
    pub clusters: Vec<JsonCluster>,
}

/// Build the JSON report for a finished run
pub fn build_report<O: Observation>(outcome: &ClusteringOutcome<O>, info: &RunInfo) -> JsonReport {
    let clusters = outcome
        .centroids
        .iter()
        .zip(&outcome.cluster_sizes)
        .map(|(centroid, &size)| JsonCluster {
            centroid: centroid.to_string(),
            size,
        })
        .collect();

    JsonReport {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: info.started_at.to_rfc3339(),
        mode: info.mode.clone(),
        kind: info.kind,
        requested_k: info.k,
        observations: info.observations,
        workers: info.workers,
        rounds: outcome.rounds,
        stop_reason: outcome.stop_reason,
        elapsed: JsonDuration::from_duration(outcome.elapsed),
        clusters,
    }
}

/// Write a report to `output_path`
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }

    writer.flush()
        .with_context(|| format!("Failed to flush JSON output: {}", output_path.display()))?;

    Ok(())
}
