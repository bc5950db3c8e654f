//! Output formatting
//!
//! - `text`: the console report (always printed)
//! - `json`: an optional machine-readable report

pub mod json;
pub mod text;

pub use json::{build_report, write_json_output, JsonReport, RunInfo};
pub use text::{format_results, print_results};
