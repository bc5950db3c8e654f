//! Worker service for parallel mode
//!
//! Listens for coordinator connections and runs one [`Worker`] per connection.
//! By default the service exits after its first session, which is what a
//! coordinator-launched localhost worker wants; `persistent` keeps it serving
//! one coordinator after another.

use super::transport::TcpTransport;
use super::worker::{local_node_id, Worker, WorkerSummary};
use super::Runnable;
use crate::observation::Observation;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Worker service
pub struct WorkerService {
    /// Port to listen on
    listen_port: u16,

    /// Keep accepting coordinators after a session ends
    persistent: bool,

    node_id: String,
}

impl WorkerService {
    /// Create a new worker service
    pub fn new(listen_port: u16, persistent: bool) -> Self {
        Self {
            listen_port,
            persistent,
            node_id: local_node_id(),
        }
    }

    /// Bind the listening socket
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = format!("0.0.0.0:{}", self.listen_port);
        TcpListener::bind(&addr).await
            .with_context(|| format!("Failed to bind worker service on {}", addr))
    }

    /// Run the worker service
    ///
    /// Returns the summary of the last session. In persistent mode a failed
    /// session is logged and the service keeps listening.
    pub async fn run<O: Observation>(self) -> Result<WorkerSummary> {
        let listener = self.bind().await?;
        self.serve::<O>(listener).await
    }

    /// Serve coordinators on an already bound listener
    pub async fn serve<O: Observation>(self, listener: TcpListener) -> Result<WorkerSummary> {
        info!(
            port = self.listen_port,
            node_id = %self.node_id,
            kind = %O::KIND,
            persistent = self.persistent,
            "worker service listening"
        );

        loop {
            let (stream, addr) = listener.accept().await
                .context("Failed to accept connection")?;

            info!(%addr, "coordinator connected");

            let worker = Worker::<O, _>::new(TcpTransport::<O>::new(stream))
                .with_node_id(self.node_id.clone());

            match worker.run().await {
                Ok(summary) if !self.persistent => return Ok(summary),
                Err(e) if !self.persistent => return Err(e),
                Ok(summary) => {
                    info!(
                        worker_id = %summary.worker_id,
                        rounds = summary.rounds_served,
                        "session complete"
                    );
                }
                Err(e) => {
                    warn!(error = %format!("{:#}", e), "session failed");
                }
            }

            info!("waiting for next coordinator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::protocol::*;
    use crate::distributed::transport::Transport;
    use crate::observation::{ObservationKind, Point};

    #[tokio::test]
    async fn test_single_session_service_exits_after_completion() {
        let service = WorkerService::new(0, false);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(service.serve::<Point>(listener));

        let mut link = TcpTransport::<Point>::connect(&addr).await.unwrap();
        link.send(&Message::Hello(HelloMessage {
            protocol_version: PROTOCOL_VERSION,
            kind: ObservationKind::Point,
            worker_index: 0,
        }))
        .await
        .unwrap();
        assert_eq!(link.recv().await.unwrap(), Message::Ready);

        link.send(&Message::Partition(PartitionMessage {
            offset: 0,
            observations: vec![Point::new(1.0, 1.0), Point::new(3.0, 3.0)],
            encoding: ResultEncoding::Indices,
        }))
        .await
        .unwrap();

        link.send(&Message::Centroids(CentroidsMessage {
            round: 1,
            centroids: vec![Point::new(0.0, 0.0), Point::new(4.0, 4.0)],
        }))
        .await
        .unwrap();

        match link.recv().await.unwrap() {
            Message::AssignmentResult(result) => {
                assert_eq!(result.payload, AssignmentPayload::Indices(vec![0, 1]));
            }
            other => panic!("Wrong message type: {}", other.kind()),
        }

        link.send(&Message::Completed).await.unwrap();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.rounds_served, 1);
        assert_eq!(summary.partition_len, 2);
    }
}
