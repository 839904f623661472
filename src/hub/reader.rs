//! Source reader task
//!
//! One reader owns the single upstream connection for a shared source.
//! It publishes every decoded frame into the shared slot as fast as the
//! source yields them; pacing is the sessions' concern, not the
//! reader's. Connection failures put the reader into a fixed-backoff
//! retry cycle that runs for as long as any subscriber remains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::slot::FrameSlot;
use crate::source::{FrameSource, SourceError, SourceStream};

/// Reader lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Opening the upstream source
    Connecting,
    /// Reading frames
    Streaming,
    /// Backing off before a reconnect attempt
    Retrying,
    /// Run flag cleared; connection released
    Stopped,
}

/// Owns one connection to a raw video source
pub struct SourceReader {
    source_id: String,
    provider: Arc<dyn FrameSource>,
    slot: Arc<FrameSlot>,
    running: Arc<AtomicBool>,
    read_timeout: Duration,
    retry_backoff: Duration,
}

impl SourceReader {
    pub(super) fn new(
        source_id: String,
        provider: Arc<dyn FrameSource>,
        slot: Arc<FrameSlot>,
        running: Arc<AtomicBool>,
        read_timeout: Duration,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            source_id,
            provider,
            slot,
            running,
            read_timeout,
            retry_backoff,
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Drive the reader until the run flag is cleared
    ///
    /// The flag is checked at every iteration boundary, so shutdown
    /// latency is bounded by one read timeout (or one backoff sleep).
    pub async fn run(self) {
        tracing::info!(source = %self.source_id, "Source reader started");

        let mut state = ReaderState::Connecting;
        let mut stream: Option<Box<dyn SourceStream>> = None;

        while self.is_running() {
            match state {
                ReaderState::Connecting => match self.provider.open(&self.source_id).await {
                    Ok(s) => {
                        tracing::info!(source = %self.source_id, "Source opened");
                        stream = Some(s);
                        state = ReaderState::Streaming;
                    }
                    Err(e) => {
                        tracing::warn!(source = %self.source_id, error = %e, "Open failed");
                        state = ReaderState::Retrying;
                    }
                },
                ReaderState::Retrying => {
                    tokio::time::sleep(self.retry_backoff).await;
                    state = ReaderState::Connecting;
                }
                ReaderState::Streaming => {
                    let Some(s) = stream.as_mut() else {
                        state = ReaderState::Connecting;
                        continue;
                    };
                    match tokio::time::timeout(self.read_timeout, s.read()).await {
                        Ok(Ok(Some(frame))) => {
                            self.slot.publish(frame);
                        }
                        Ok(Ok(None)) => {
                            // End of stream: reopen rather than terminate,
                            // live sources come back
                            tracing::warn!(source = %self.source_id, "Source ended, reopening");
                            stream = None;
                            state = ReaderState::Retrying;
                        }
                        Ok(Err(SourceError::Decode(msg))) => {
                            // Malformed record: drop it, keep the connection
                            tracing::debug!(source = %self.source_id, error = %msg, "Frame discarded");
                        }
                        Ok(Err(SourceError::Connection(msg))) => {
                            tracing::warn!(source = %self.source_id, error = %msg, "Read failed, reopening");
                            stream = None;
                            state = ReaderState::Retrying;
                        }
                        Err(_) => {
                            tracing::warn!(source = %self.source_id, "Read timed out, reopening");
                            stream = None;
                            state = ReaderState::Retrying;
                        }
                    }
                }
                ReaderState::Stopped => break,
            }
        }

        // Dropping the stream releases the upstream connection
        drop(stream);
        tracing::info!(source = %self.source_id, "Source reader stopped");
    }
}
