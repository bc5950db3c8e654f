//! Human-readable text output

use crate::cluster::ClusteringOutcome;
use crate::observation::Observation;
use crate::util::time::format_duration;
use std::fmt::Write;

/// Print clustering results to console
///
/// Displays:
/// - The final centroids, one per line
/// - Cluster sizes and rounds
/// - Elapsed time in nanoseconds and seconds
pub fn print_results<O: Observation>(outcome: &ClusteringOutcome<O>) {
    print!("{}", format_results(outcome));
}

/// Render the console report
pub fn format_results<O: Observation>(outcome: &ClusteringOutcome<O>) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "The final cluster centroids:");
    for centroid in &outcome.centroids {
        let _ = writeln!(out, "{}", centroid);
    }

    let sizes: Vec<String> = outcome.cluster_sizes.iter().map(|s| s.to_string()).collect();
    let _ = writeln!(out);
    let _ = writeln!(out, "Cluster sizes: {}", sizes.join(", "));
    let _ = writeln!(out, "Rounds: {} ({})", outcome.rounds, outcome.stop_reason);

    let nanos = outcome.elapsed.as_nanos();
    let _ = writeln!(
        out,
        "Time taken to find cluster centroids {} nanoseconds, or {} seconds ({})",
        nanos,
        outcome.elapsed.as_secs_f64(),
        format_duration(outcome.elapsed)
    );

    out
}
