//! Coordinator/worker protocol
//!
//! This module defines the messages exchanged between the coordinator and its
//! workers. The protocol uses MessagePack (rmp-serde) for compact binary
//! serialization with full serde feature support.
//!
//! # Protocol Version
//!
//! Current version: 1
//!
//! # Message Flow
//!
//! ```text
//! Coordinator                         Worker
//!     |                                  |
//!     |------ HELLO -------------------->|
//!     |<----- READY ---------------------|
//!     |------ PARTITION (once) --------->|
//!     |                                  |
//!     |------ CENTROIDS(round 1) ------->|
//!     |<----- ASSIGNMENT_RESULT(1) ------|
//!     |               ...                |
//!     |------ CENTROIDS(round n) ------->|
//!     |<----- ASSIGNMENT_RESULT(n) ------|
//!     |                                  |
//!     |------ COMPLETED ---------------->|
//! ```
//!
//! HELLO and READY carry no observations, so they decode the same whatever
//! observation type each side was started with. The worker checks the protocol
//! version and observation kind from HELLO before any typed message arrives and
//! answers with ERROR instead of READY when they do not match.
//!
//! A worker that fails answers with ERROR instead of a result.
//!
//! # Message Framing
//!
//! Each message is prefixed with a 4-byte length field (little-endian u32):
//!
//! ```text
//! [4 bytes: message length][N bytes: MessagePack-serialized message]
//! ```

use crate::cluster::CentroidSet;
use crate::observation::ObservationKind;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol version
///
/// Increment this when making breaking changes to the protocol.
/// Coordinator and workers must have matching protocol versions.
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest frame accepted from the wire (256MB)
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

/// Protocol message
///
/// All messages exchanged between the coordinator and workers. Generic over
/// the observation type so a run over points never carries strands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message<O> {
    /// Handshake (Coordinator → Worker)
    ///
    /// First message on every link.
    Hello(HelloMessage),

    /// Handshake accepted (Worker → Coordinator)
    Ready,

    /// Partition message (Coordinator → Worker)
    ///
    /// Sent exactly once per worker, before the first round.
    Partition(PartitionMessage<O>),

    /// Centroids message (Coordinator → Worker)
    ///
    /// Sent to every worker at the start of every round. Carries the full
    /// centroid set; its ordering defines cluster indices for the round.
    Centroids(CentroidsMessage<O>),

    /// Assignment result (Worker → Coordinator)
    ///
    /// The worker's nearest-centroid result for its partition.
    AssignmentResult(AssignmentMessage<O>),

    /// Completion signal (Coordinator → Worker)
    ///
    /// No further messages follow; the worker exits its loop.
    Completed,

    /// Error message (Worker → Coordinator)
    ///
    /// Sent by a worker that cannot continue. The coordinator aborts the run.
    Error(ErrorMessage),
}

impl<O> Message<O> {
    /// Short name for log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello(_) => "HELLO",
            Message::Ready => "READY",
            Message::Partition(_) => "PARTITION",
            Message::Centroids(_) => "CENTROIDS",
            Message::AssignmentResult(_) => "ASSIGNMENT_RESULT",
            Message::Completed => "COMPLETED",
            Message::Error(_) => "ERROR",
        }
    }
}

/// How a worker reports its assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResultEncoding {
    /// One centroid index per partition observation, in partition order
    Indices,
    /// Partition observations grouped per centroid index
    Groups,
}

impl ResultEncoding {
    /// Default encoding per observation kind
    ///
    /// Strands report compact indices; points report grouped observations.
    pub fn default_for(kind: ObservationKind) -> Self {
        match kind {
            ObservationKind::Dna => ResultEncoding::Indices,
            ObservationKind::Point => ResultEncoding::Groups,
        }
    }
}

/// Handshake message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloMessage {
    /// Protocol version (must match)
    pub protocol_version: u32,

    /// Observation kind the coordinator is clustering (must match)
    pub kind: ObservationKind,

    /// Index of the receiving worker
    pub worker_index: usize,
}

/// Partition message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionMessage<O> {
    /// Offset of this partition in the full dataset
    pub offset: usize,

    /// This worker's observations, kept for the whole run
    pub observations: Vec<O>,

    /// Result encoding the coordinator expects
    pub encoding: ResultEncoding,
}

/// Centroids message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidsMessage<O> {
    /// Round number (1-based)
    pub round: usize,

    /// Current centroid set
    pub centroids: CentroidSet<O>,
}

/// Worker assignment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMessage<O> {
    /// Round this result answers
    pub round: usize,

    pub payload: AssignmentPayload<O>,
}

/// Assignment payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignmentPayload<O> {
    /// Centroid index per observation, in partition order
    Indices(Vec<usize>),

    /// One group per centroid index
    Groups(Vec<Vec<O>>),
}

impl<O> AssignmentPayload<O> {
    /// Number of observations covered by this payload
    pub fn observation_count(&self) -> usize {
        match self {
            AssignmentPayload::Indices(indices) => indices.len(),
            AssignmentPayload::Groups(groups) => groups.iter().map(Vec::len).sum(),
        }
    }
}

/// Error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Worker identifier (hostname and index)
    pub worker_id: String,

    /// Error description
    pub error: String,

    /// Round during which the error occurred (0 before the first round)
    pub round: usize,
}

/// Serialize a message to bytes
///
/// Prepends a 4-byte length field for framing.
///
/// # Message Format
///
/// ```text
/// [4 bytes: message length (little-endian u32)][N bytes: MessagePack message]
/// ```
pub fn serialize_message<O: Serialize>(msg: &Message<O>) -> Result<Vec<u8>> {
    let msg_bytes = rmp_serde::to_vec(msg)
        .context("Failed to serialize message")?;

    if msg_bytes.len() > MAX_FRAME_LEN {
        anyhow::bail!("Message too large: {} bytes (max {} bytes)", msg_bytes.len(), MAX_FRAME_LEN);
    }

    let msg_len = msg_bytes.len() as u32;
    let mut framed = Vec::with_capacity(4 + msg_bytes.len());
    framed.extend_from_slice(&msg_len.to_le_bytes());
    framed.extend_from_slice(&msg_bytes);

    Ok(framed)
}

/// Read a complete message from a stream
///
/// Reads the length prefix, then the message body.
pub async fn read_message<O, R>(stream: &mut R) -> Result<Message<O>>
where
    O: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await
        .context("Failed to read message length")?;

    let msg_len = u32::from_le_bytes(len_buf) as usize;

    // Reject corrupt or hostile lengths before allocating
    if msg_len > MAX_FRAME_LEN {
        anyhow::bail!("Message too large: {} bytes (max {} bytes)", msg_len, MAX_FRAME_LEN);
    }

    let mut msg_buf = vec![0u8; msg_len];
    stream.read_exact(&mut msg_buf).await
        .context("Failed to read message body")?;

    let msg = rmp_serde::from_slice(&msg_buf)
        .context("Failed to deserialize message")?;

    Ok(msg)
}

/// Write a message to a stream
///
/// Serializes the message with length prefix, writes and flushes it.
pub async fn write_message<O, W>(stream: &mut W, msg: &Message<O>) -> Result<()>
where
    O: Serialize,
    W: AsyncWrite + Unpin,
{
    let framed = serialize_message(msg)?;

    stream.write_all(&framed).await
        .context("Failed to write message")?;

    stream.flush().await
        .context("Failed to flush stream")?;

    Ok(())
}
