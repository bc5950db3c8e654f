//! Localhost worker processes for parallel mode
//!
//! When no worker addresses are configured, parallel mode starts its own
//! workers by re-running the current executable in worker mode. The processes
//! are owned by [`LocalWorkers`], which reaps them when dropped, including on
//! early error returns.

use crate::observation::ObservationKind;
use anyhow::{Context, Result};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

/// Ports tried for launched localhost workers
pub const WORKER_PORTS: std::ops::Range<u16> = 9999..11000;

/// Time launched workers get to exit on their own before being killed
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Worker processes launched on localhost
///
/// Workers exit on COMPLETED or when the coordinator disconnects; whatever is
/// still running after a short grace period is killed.
pub struct LocalWorkers {
    children: Vec<Child>,
    debug: bool,
}

impl LocalWorkers {
    pub fn new(debug: bool) -> Self {
        Self {
            children: Vec::new(),
            debug,
        }
    }

    /// Launch one worker listening on `port`
    pub fn launch(
        &mut self,
        port: u16,
        kind: ObservationKind,
        log_level: Option<&str>,
    ) -> Result<()> {
        let exe_path = std::env::current_exe()
            .context("Failed to get current executable path")?;

        let mut cmd = Command::new(&exe_path);
        cmd.arg("--mode").arg("worker");
        cmd.arg("--listen-port").arg(port.to_string());
        cmd.arg("--kind").arg(kind.to_string());

        if let Some(level) = log_level {
            cmd.arg("--log-level").arg(level);
        }

        // Worker output goes to a log file in debug mode, nowhere otherwise
        if self.debug {
            let log_path = format!("/tmp/kcluster_worker_{}.log", port);
            let log_file = std::fs::File::create(&log_path)
                .with_context(|| format!("Failed to create worker log file {}", log_path))?;
            cmd.stdout(Stdio::from(log_file.try_clone()?));
            cmd.stderr(Stdio::from(log_file));
            eprintln!("DEBUG: Worker log: {}", log_path);
        } else {
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());
        }

        let pid = self.spawn(&mut cmd)?;
        debug!(port, pid, "worker launched");

        Ok(())
    }

    /// Spawn `cmd` and take ownership of the process
    pub fn spawn(&mut self, cmd: &mut Command) -> Result<u32> {
        let child = cmd.spawn()
            .context("Failed to spawn worker process")?;
        let pid = child.id();
        self.children.push(child);
        Ok(pid)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Reap every worker, killing the ones still running after the grace period
    pub fn shutdown(&mut self) {
        let mut running = Vec::new();

        for mut child in self.children.drain(..) {
            match child.try_wait() {
                Ok(Some(status)) => debug!(pid = child.id(), %status, "worker already exited"),
                Ok(None) => running.push(child),
                Err(e) => {
                    warn!(pid = child.id(), error = %e, "failed to poll worker");
                    running.push(child);
                }
            }
        }

        if running.is_empty() {
            return;
        }

        std::thread::sleep(EXIT_GRACE);

        for mut child in running {
            let pid = child.id();
            if let Ok(Some(status)) = child.try_wait() {
                debug!(pid, %status, "worker exited");
                continue;
            }

            debug!(pid, "worker still running, killing");
            if let Err(e) = child.kill() {
                warn!(pid, error = %e, "failed to kill worker");
            }
            match child.wait() {
                Ok(status) => debug!(pid, %status, "worker killed"),
                Err(e) => warn!(pid, error = %e, "failed to reap worker"),
            }
        }
    }
}

impl Drop for LocalWorkers {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Find `count` free localhost ports in [`WORKER_PORTS`]
pub fn find_available_ports(count: usize) -> Result<Vec<u16>> {
    // Hold every listener until the search is done so ports are distinct
    let mut held = Vec::with_capacity(count);

    for port in WORKER_PORTS {
        if held.len() == count {
            break;
        }
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!(port, "port available");
            held.push((port, listener));
        }
    }

    if held.len() < count {
        anyhow::bail!(
            "Only {} of {} ports available in range {}-{}. Please close other kcluster instances or pass --host-list.",
            held.len(),
            count,
            WORKER_PORTS.start,
            WORKER_PORTS.end - 1
        );
    }

    Ok(held.into_iter().map(|(port, _)| port).collect())
}
