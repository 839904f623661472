//! Statistics and metrics for hub sessions and stages

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Windowed events-per-second counter
///
/// Counts events in the current window; when the window elapses the
/// count becomes the published rate. This is the coarse throughput
/// gauge shown for inference stages, not a precise rate estimator.
pub struct RollingRate {
    window: Duration,
    state: Mutex<RateState>,
}

struct RateState {
    count: u64,
    window_start: Instant,
    rate: f64,
}

impl RollingRate {
    /// Create a counter with a one-second window
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    /// Create a counter with a custom window
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            state: Mutex::new(RateState {
                count: 0,
                window_start: Instant::now(),
                rate: 0.0,
            }),
        }
    }

    /// Record one event
    pub fn tick(&self) {
        let mut state = self.state.lock().unwrap();
        state.count += 1;

        let elapsed = state.window_start.elapsed();
        if elapsed >= self.window {
            state.rate = state.count as f64 / elapsed.as_secs_f64();
            state.count = 0;
            state.window_start = Instant::now();
        }
    }

    /// The rate published at the end of the last full window
    pub fn per_second(&self) -> f64 {
        self.state.lock().unwrap().rate
    }
}

impl Default for RollingRate {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters accumulated over one session's lifetime
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Frames sampled and processed
    pub frames: u64,
    /// Iterations that found no frame in the slot
    pub empty_reads: u64,
    /// Heartbeat messages emitted
    pub heartbeats: u64,
    /// Iterations whose processing overran the sample period
    pub overruns: u64,
    /// Inference or delivery errors observed
    pub errors: u64,
    /// Submissions that displaced an older queued frame
    pub dropped_submissions: u64,
}
