//! Stream hub implementation
//!
//! The central registry that shares one upstream reader per source among
//! every session subscribed to it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::config::HubConfig;
use super::entry::{SourceEntry, SourceStats};
use super::error::HubError;
use super::reader::SourceReader;
use super::slot::FrameSlot;
use crate::source::FrameSource;

/// Shares one reader per source id among all subscribers
///
/// All map mutation happens under one coarse async mutex, which is what
/// makes subscribe/teardown interleavings safe: a subscribe racing a
/// teardown either finds the entry already removed (and builds a fresh
/// one) or is ordered strictly after the teardown's critical section.
/// The lock is never held across a read, an inference call, or a sink
/// send.
///
/// Construct one hub at startup and hand an `Arc` to every session;
/// the lifecycle is explicit, there is no process-wide instance.
pub struct StreamHub {
    sources: Mutex<HashMap<String, SourceEntry>>,
    provider: Arc<dyn FrameSource>,
    config: HubConfig,
}

impl StreamHub {
    /// Create a hub with default configuration
    pub fn new(provider: Arc<dyn FrameSource>) -> Self {
        Self::with_config(provider, HubConfig::default())
    }

    /// Create a hub with custom configuration
    pub fn with_config(provider: Arc<dyn FrameSource>, config: HubConfig) -> Self {
        Self {
            sources: Mutex::new(HashMap::new()),
            provider,
            config,
        }
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Subscribe to a source
    ///
    /// Returns a handle to the shared latest-frame slot. The first
    /// subscriber for an id constructs the slot and starts the reader;
    /// later subscribers attach to the same slot. Rejects with
    /// [`HubError::Capacity`] when the per-source limit is already met.
    /// The limit is checked at enqueue time and the caller is never
    /// blocked waiting for a slot to free.
    pub async fn subscribe(&self, source_id: &str) -> Result<Arc<FrameSlot>, HubError> {
        let mut sources = self.sources.lock().await;
        let limit = self.config.max_subscribers_per_source;

        if let Some(entry) = sources.get_mut(source_id) {
            if entry.subscribers >= limit {
                return Err(HubError::Capacity {
                    source: source_id.to_string(),
                    limit,
                });
            }

            entry.subscribers += 1;
            tracing::info!(
                source = %source_id,
                subscribers = entry.subscribers,
                "Subscriber added"
            );
            return Ok(Arc::clone(&entry.slot));
        }

        if limit == 0 {
            return Err(HubError::Capacity {
                source: source_id.to_string(),
                limit,
            });
        }

        // First subscriber: build the slot and start the reader
        let mut entry = SourceEntry::new();
        entry.subscribers = 1;

        let reader = SourceReader::new(
            source_id.to_string(),
            Arc::clone(&self.provider),
            Arc::clone(&entry.slot),
            Arc::clone(&entry.running),
            self.config.read_timeout,
            self.config.retry_backoff,
        );
        tokio::spawn(reader.run());

        let slot = Arc::clone(&entry.slot);
        sources.insert(source_id.to_string(), entry);

        tracing::info!(source = %source_id, "First subscriber, reader started");
        Ok(slot)
    }

    /// Unsubscribe from a source
    ///
    /// The last unsubscriber tears the source down: the reader's run
    /// flag is cleared, the slot is deactivated, and the entry is
    /// removed, all inside the map lock. An unsubscribe for an id with
    /// no entry is logged and ignored, so the refcount can never go
    /// negative even under duplicate failure signals.
    pub async fn unsubscribe(&self, source_id: &str) {
        let mut sources = self.sources.lock().await;

        let Some(entry) = sources.get_mut(source_id) else {
            tracing::warn!(source = %source_id, "Unsubscribe for unknown source ignored");
            return;
        };

        entry.subscribers = entry.subscribers.saturating_sub(1);

        if entry.subscribers == 0 {
            entry.tear_down();
            sources.remove(source_id);
            tracing::info!(source = %source_id, "Last subscriber gone, reader stopping");
        } else {
            tracing::info!(
                source = %source_id,
                subscribers = entry.subscribers,
                "Subscriber removed"
            );
        }
    }

    /// Number of active subscribers for a source (0 if unknown)
    pub async fn subscriber_count(&self, source_id: &str) -> u32 {
        self.sources
            .lock()
            .await
            .get(source_id)
            .map(|e| e.subscribers)
            .unwrap_or(0)
    }

    /// Snapshot of one source's state
    pub async fn source_stats(&self, source_id: &str) -> Option<SourceStats> {
        let sources = self.sources.lock().await;
        sources.get(source_id).map(|e| SourceStats {
            subscribers: e.subscribers,
            running: e.running.load(std::sync::atomic::Ordering::Acquire),
            uptime: e.started_at.elapsed(),
        })
    }

    /// Number of sources with at least one subscriber
    pub async fn source_count(&self) -> usize {
        self.sources.lock().await.len()
    }

    /// Tear down every source regardless of subscriber count
    ///
    /// For process shutdown; sessions still holding slots observe them
    /// as deactivated.
    pub async fn shutdown(&self) {
        let mut sources = self.sources.lock().await;
        for (id, entry) in sources.drain() {
            entry.tear_down();
            tracing::info!(source = %id, "Source torn down at shutdown");
        }
    }
}
