//! Outbound delivery capability
//!
//! The boundary to whatever carries messages to a consumer: a
//! WebSocket connection, a test harness, a log. The session loop only
//! ever talks to [`OutputSink`]; wire framing lives outside the crate.

use tokio::sync::mpsc;

use crate::session::message::OutboundMessage;

/// Why a sink is being closed
///
/// Capacity rejection uses a code distinct from a normal disconnect so
/// clients can tell "come back later" from "goodbye".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// Normal end of session
    Normal,
    /// Rejected: the source's subscriber limit is reached
    CapacityExceeded,
    /// Terminated by an internal error
    Error,
}

impl CloseCode {
    /// WebSocket-compatible numeric code
    pub fn wire_code(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::CapacityExceeded => 1008,
            CloseCode::Error => 1011,
        }
    }
}

/// Error delivering to a consumer
#[derive(Debug, Clone)]
pub enum SinkError {
    /// The consumer is gone
    Closed,
    /// Delivery failed for another reason
    Delivery(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Closed => write!(f, "output sink closed"),
            SinkError::Delivery(msg) => write!(f, "delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// Delivery abstraction for session output
///
/// A failed `send` tears the owning session down; implementations
/// should fail fast rather than retry internally.
#[async_trait::async_trait]
pub trait OutputSink: Send {
    /// Deliver one message
    async fn send(&mut self, message: &OutboundMessage) -> Result<(), SinkError>;

    /// Close the sink with the given code
    ///
    /// Best-effort; called exactly once at the end of a session.
    async fn close(&mut self, code: CloseCode);
}

/// Sink that forwards messages over an in-process channel
///
/// The transport layer (or a test) holds the receiving end. Dropping
/// the receiver makes `send` fail with [`SinkError::Closed`], which is
/// how consumer disconnects reach the session loop.
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundMessage>,
    closed_with: Option<CloseCode>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its messages
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                tx,
                closed_with: None,
            },
            rx,
        )
    }

    /// The close code, once the session has closed the sink
    pub fn close_code(&self) -> Option<CloseCode> {
        self.closed_with
    }
}

#[async_trait::async_trait]
impl OutputSink for ChannelSink {
    async fn send(&mut self, message: &OutboundMessage) -> Result<(), SinkError> {
        self.tx
            .send(message.clone())
            .await
            .map_err(|_| SinkError::Closed)
    }

    async fn close(&mut self, code: CloseCode) {
        self.closed_with = Some(code);
    }
}
