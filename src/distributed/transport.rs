//! Message transport
//!
//! A [`Transport`] is one end of an ordered, point-to-point link between the
//! coordinator and a single worker. Each `send`/`recv` moves one whole
//! [`Message`]; the caller waits for it to complete before moving on, so
//! messages on a link are never reordered or interleaved.
//!
//! # Implementations
//!
//! - [`TcpTransport`]: length-prefixed MessagePack frames over a TCP stream
//! - [`ChannelTransport`]: in-process tokio channels, for tests and embedding
//!
//! There are no timeouts: a peer that never answers stalls the run.

use super::protocol::{read_message, write_message, Message};
use crate::observation::Observation;
use anyhow::{Context, Result};
use std::future::Future;
use std::marker::PhantomData;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Ordered point-to-point message link
pub trait Transport<O: Observation>: Send {
    /// Send one message to the peer
    fn send(&mut self, msg: &Message<O>) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next message from the peer
    fn recv(&mut self) -> impl Future<Output = Result<Message<O>>> + Send;

    /// Peer description for log and error messages
    fn peer(&self) -> &str;
}

/// TCP transport
pub struct TcpTransport<O> {
    stream: TcpStream,
    peer: String,
    _observation: PhantomData<fn() -> O>,
}

impl<O: Observation> TcpTransport<O> {
    /// Wrap an established stream
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Frames are written whole; don't let Nagle hold back small replies
        let _ = stream.set_nodelay(true);

        Self {
            stream,
            peer,
            _observation: PhantomData,
        }
    }

    /// Connect to a worker at `addr`
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        Ok(Self::new(stream))
    }
}

impl<O: Observation> Transport<O> for TcpTransport<O> {
    async fn send(&mut self, msg: &Message<O>) -> Result<()> {
        write_message(&mut self.stream, msg).await
            .with_context(|| format!("Failed to send {} to {}", msg.kind(), self.peer))
    }

    async fn recv(&mut self) -> Result<Message<O>> {
        read_message(&mut self.stream).await
            .with_context(|| format!("Failed to receive message from {}", self.peer))
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

/// In-process channel transport
pub struct ChannelTransport<O> {
    tx: mpsc::UnboundedSender<Message<O>>,
    rx: mpsc::UnboundedReceiver<Message<O>>,
    peer: String,
}

/// Connected pair of channel transports: (coordinator end, worker end)
pub fn channel_pair<O: Observation>(name: &str) -> (ChannelTransport<O>, ChannelTransport<O>) {
    let (to_worker, from_coordinator) = mpsc::unbounded_channel();
    let (to_coordinator, from_worker) = mpsc::unbounded_channel();

    let coordinator_end = ChannelTransport {
        tx: to_worker,
        rx: from_worker,
        peer: name.to_string(),
    };
    let worker_end = ChannelTransport {
        tx: to_coordinator,
        rx: from_coordinator,
        peer: "coordinator".to_string(),
    };

    (coordinator_end, worker_end)
}

impl<O: Observation> Transport<O> for ChannelTransport<O> {
    async fn send(&mut self, msg: &Message<O>) -> Result<()> {
        self.tx
            .send(msg.clone())
            .map_err(|_| {
                anyhow::anyhow!("Failed to send {} to {}: peer hung up", msg.kind(), self.peer)
            })
    }

    async fn recv(&mut self) -> Result<Message<O>> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| {
                anyhow::anyhow!("Failed to receive message from {}: peer hung up", self.peer)
            })
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::protocol::{CentroidsMessage, ErrorMessage};
    use crate::observation::Point;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_channel_pair_round_trip() {
        let (mut coordinator, mut worker) = channel_pair::<Point>("worker-0");

        let msg = Message::Centroids(CentroidsMessage {
            round: 1,
            centroids: vec![Point::new(1.0, 1.0)],
        });
        coordinator.send(&msg).await.unwrap();
        assert_eq!(worker.recv().await.unwrap(), msg);

        worker.send(&Message::Completed).await.unwrap();
        assert_eq!(coordinator.recv().await.unwrap(), Message::Completed);

        assert_eq!(coordinator.peer(), "worker-0");
        assert_eq!(worker.peer(), "coordinator");
    }

    #[tokio::test]
    async fn test_channel_hang_up_is_an_error() {
        let (mut coordinator, worker) = channel_pair::<Point>("worker-0");
        drop(worker);

        assert!(coordinator.send(&Message::Completed).await.is_err());
        assert!(coordinator.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = TcpTransport::<Point>::new(stream);
            let msg = transport.recv().await.unwrap();
            transport.send(&msg).await.unwrap();
        });

        let mut client = TcpTransport::<Point>::connect(&addr).await.unwrap();
        let msg = Message::Error(ErrorMessage {
            worker_id: "node-a/0".to_string(),
            error: "boom".to_string(),
            round: 3,
        });
        client.send(&msg).await.unwrap();
        assert_eq!(client.recv().await.unwrap(), msg);

        server.await.unwrap();
    }
}
