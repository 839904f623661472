//! Hub configuration

use std::time::Duration;

/// Configuration for a [`StreamHub`](super::StreamHub)
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum simultaneous subscribers per source
    pub max_subscribers_per_source: u32,

    /// Timeout for a single read from an open source
    ///
    /// Also bounds how long a reader takes to notice teardown, since the
    /// run flag is checked once per read cycle.
    pub read_timeout: Duration,

    /// Backoff between reconnect attempts while a source is down
    pub retry_backoff: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_subscribers_per_source: 5,
            read_timeout: Duration::from_secs(2),
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl HubConfig {
    /// Set the per-source subscriber limit
    pub fn max_subscribers_per_source(mut self, max: u32) -> Self {
        self.max_subscribers_per_source = max;
        self
    }

    /// Set the per-read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the reconnect backoff
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}
