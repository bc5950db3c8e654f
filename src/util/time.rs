//! Run timing
//!
//! A [`RunContext`] is created once when a run starts and handed to the engine,
//! which reads the elapsed time from it when the run completes. There is no
//! process-wide start time.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Explicit per-run context
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// Start timing a run now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Wall-clock time since the run started
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock start time, for reports
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::start()
    }
}

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kcluster::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_run_context_elapsed() {
        let ctx = RunContext::start();
        thread::sleep(Duration::from_millis(10));

        assert!(ctx.elapsed() >= Duration::from_millis(10));
        assert!(ctx.started_at() <= Utc::now());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
    }
}
