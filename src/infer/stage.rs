//! Inference stage
//!
//! A stage decouples model execution from the frame rate: the session
//! loop drops frames into a small drop-oldest queue and reads whatever
//! result is newest, while one worker task drains the queue at the
//! model's own pace. A result may therefore describe an older frame
//! than the one most recently submitted: latest wins on both sides,
//! frame/result synchronization is deliberately not provided.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use crate::frame::Frame;
use crate::hub::LatestSlot;
use crate::stats::RollingRate;

use super::backend::{InferenceBackend, InferenceParams};
use super::queue::SubmitQueue;
use super::region::Region;

/// Configuration for an [`InferenceStage`]
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Capacity of the submission queue
    pub queue_capacity: usize,

    /// Worker dequeue timeout; also the cancellation check interval
    pub poll_timeout: Duration,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 2,
            poll_timeout: Duration::from_millis(100),
        }
    }
}

impl StageConfig {
    /// Set the submission queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the worker poll timeout
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }
}

/// One completed inference pass
#[derive(Debug, Clone)]
pub struct StageOutput {
    /// Regions that survived the confidence and class filters
    pub regions: Vec<Region>,
    /// How long the backend call took
    pub inference_time: Duration,
    /// When the pass completed
    pub completed_at: SystemTime,
}

/// A running inference worker and its queues
///
/// `submit` never blocks the caller; when the queue is full the oldest
/// waiting frame is displaced. `latest` reads the most recent published
/// result without waiting. Consecutive backend failures are counted so
/// sessions can enforce a retry budget; any success resets the count.
pub struct InferenceStage {
    name: String,
    queue: Arc<SubmitQueue<Frame>>,
    results: Arc<LatestSlot<StageOutput>>,
    running: Arc<AtomicBool>,
    rate: Arc<RollingRate>,
    consecutive_failures: Arc<AtomicU32>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl InferenceStage {
    /// Start a stage worker for the given backend
    pub fn spawn(
        backend: Arc<dyn InferenceBackend>,
        params: InferenceParams,
        config: StageConfig,
    ) -> Self {
        let name = backend.name().to_string();
        let queue = Arc::new(SubmitQueue::new(config.queue_capacity));
        let results = Arc::new(LatestSlot::new());
        let running = Arc::new(AtomicBool::new(true));
        let rate = Arc::new(RollingRate::new());
        let consecutive_failures = Arc::new(AtomicU32::new(0));
        let last_error = Arc::new(Mutex::new(None));

        let worker = Worker {
            backend,
            params,
            poll_timeout: config.poll_timeout,
            queue: Arc::clone(&queue),
            results: Arc::clone(&results),
            running: Arc::clone(&running),
            rate: Arc::clone(&rate),
            consecutive_failures: Arc::clone(&consecutive_failures),
            last_error: Arc::clone(&last_error),
        };
        tokio::spawn(worker.run());

        Self {
            name,
            queue,
            results,
            running,
            rate,
            consecutive_failures,
            last_error,
        }
    }

    /// The backend name this stage runs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a frame for inference
    ///
    /// Never blocks. Returns `true` when an older queued frame was
    /// displaced to make room.
    pub fn submit(&self, frame: Frame) -> bool {
        self.queue.push(frame)
    }

    /// The most recent result, if any
    pub fn latest(&self) -> Option<StageOutput> {
        self.results.latest()
    }

    /// Results published per second over the last window
    pub fn results_per_second(&self) -> f64 {
        self.rate.per_second()
    }

    /// Backend failures since the last success
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Message of the most recent backend failure
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    /// Stop the worker and deactivate the result slot
    ///
    /// Cooperative: the worker observes the flag within one poll
    /// timeout. Results published by an in-flight pass after shutdown
    /// are discarded by the deactivated slot.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        self.results.deactivate();
    }
}

impl Drop for InferenceStage {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    backend: Arc<dyn InferenceBackend>,
    params: InferenceParams,
    poll_timeout: Duration,
    queue: Arc<SubmitQueue<Frame>>,
    results: Arc<LatestSlot<StageOutput>>,
    running: Arc<AtomicBool>,
    rate: Arc<RollingRate>,
    consecutive_failures: Arc<AtomicU32>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl Worker {
    async fn run(self) {
        tracing::debug!(backend = %self.backend.name(), "Inference worker started");

        while self.running.load(Ordering::Acquire) {
            let Some(frame) = self.queue.recv_timeout(self.poll_timeout).await else {
                continue;
            };

            let started = Instant::now();
            match self.backend.infer(&frame, &self.params).await {
                Ok(regions) => {
                    let output = StageOutput {
                        regions: self.filter(regions),
                        inference_time: started.elapsed(),
                        completed_at: SystemTime::now(),
                    };
                    self.results.publish(output);
                    self.rate.tick();
                    self.consecutive_failures.store(0, Ordering::Release);
                }
                Err(e) => {
                    let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                    *self.last_error.lock().unwrap() = Some(e.to_string());
                    tracing::warn!(
                        backend = %self.backend.name(),
                        failures = failures,
                        error = %e,
                        "Inference failed"
                    );
                }
            }
        }

        tracing::debug!(backend = %self.backend.name(), "Inference worker stopped");
    }

    /// Apply the confidence floor, class allow-list, and geometry checks
    fn filter(&self, regions: Vec<Region>) -> Vec<Region> {
        regions
            .into_iter()
            .filter(|r| r.is_well_formed())
            .filter(|r| r.confidence() >= self.params.confidence)
            .filter(|r| match (&self.params.classes, r.label()) {
                (Some(allowed), Some(label)) => allowed.iter().any(|c| c == label),
                _ => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::backend::InferenceError;
    use crate::infer::region::{Point, Rect};
    use bytes::Bytes;

    fn frame() -> Frame {
        Frame::new(Bytes::from_static(&[0u8; 16]), 4, 4)
    }

    fn fast_config() -> StageConfig {
        StageConfig::default().poll_timeout(Duration::from_millis(10))
    }

    /// Backend returning a fixed region set
    struct FixedBackend(Vec<Region>);

    #[async_trait::async_trait]
    impl InferenceBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn infer(
            &self,
            _frame: &Frame,
            _params: &InferenceParams,
        ) -> Result<Vec<Region>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    /// Backend that always fails
    struct FailingBackend;

    #[async_trait::async_trait]
    impl InferenceBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn infer(
            &self,
            _frame: &Frame,
            _params: &InferenceParams,
        ) -> Result<Vec<Region>, InferenceError> {
            Err(InferenceError::new("failing", "model exploded"))
        }
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..100 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_stage_publishes_filtered_results() {
        let backend = Arc::new(FixedBackend(vec![
            Region::object("person", 0.9, Rect(0.0, 0.0, 1.0, 1.0)),
            Region::object("person", 0.1, Rect(0.0, 0.0, 1.0, 1.0)), // below floor
            Region::object("car", 0.8, Rect(0.0, 0.0, 1.0, 1.0)),    // filtered class
            Region::text("hi", 0.9, vec![Point(0.0, 0.0), Point(1.0, 0.0)]), // bad polygon
        ]));
        let params = InferenceParams::default()
            .confidence(0.5)
            .classes(vec!["person".to_string()]);
        let stage = InferenceStage::spawn(backend, params, fast_config());

        assert!(stage.latest().is_none());
        stage.submit(frame());

        wait_for(|| stage.latest().is_some()).await;
        let output = stage.latest().unwrap();
        assert_eq!(output.regions.len(), 1);
        assert_eq!(output.regions[0].label(), Some("person"));
        assert_eq!(stage.consecutive_failures(), 0);

        stage.shutdown();
    }

    #[tokio::test]
    async fn test_text_regions_pass_class_filter() {
        let backend = Arc::new(FixedBackend(vec![Region::text(
            "EXIT",
            0.8,
            vec![Point(0.0, 0.0), Point(1.0, 0.0), Point(1.0, 1.0)],
        )]));
        let params = InferenceParams::default()
            .confidence(0.5)
            .classes(vec!["person".to_string()]);
        let stage = InferenceStage::spawn(backend, params, fast_config());

        stage.submit(frame());
        wait_for(|| stage.latest().is_some()).await;

        // The allow-list applies to object labels, not recognized text
        assert_eq!(stage.latest().unwrap().regions.len(), 1);

        stage.shutdown();
    }

    #[tokio::test]
    async fn test_failures_accumulate_and_reset() {
        let stage = InferenceStage::spawn(
            Arc::new(FailingBackend),
            InferenceParams::default(),
            fast_config(),
        );

        stage.submit(frame());
        wait_for(|| stage.consecutive_failures() == 1).await;
        stage.submit(frame());
        wait_for(|| stage.consecutive_failures() == 2).await;
        stage.submit(frame());
        wait_for(|| stage.consecutive_failures() == 3).await;

        assert!(stage.latest().is_none());
        assert!(stage.last_error().unwrap().contains("model exploded"));

        stage.shutdown();
    }

    /// Backend that labels its result with the frame width, slowly
    struct SlowEcho;

    #[async_trait::async_trait]
    impl InferenceBackend for SlowEcho {
        fn name(&self) -> &str {
            "slow-echo"
        }

        async fn infer(
            &self,
            frame: &Frame,
            _params: &InferenceParams,
        ) -> Result<Vec<Region>, InferenceError> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(vec![Region::object(
                format!("w{}", frame.width),
                0.9,
                Rect(0.0, 0.0, 1.0, 1.0),
            )])
        }
    }

    fn frame_w(width: u32) -> Frame {
        Frame::new(Bytes::from_static(&[0u8; 16]), width, 4)
    }

    #[tokio::test]
    async fn test_latest_result_may_lag_submissions() {
        let stage = InferenceStage::spawn(
            Arc::new(SlowEcho),
            InferenceParams::default(),
            fast_config(),
        );

        stage.submit(frame_w(10));
        wait_for(|| stage.latest().is_some()).await;

        // Two newer frames queued; the published result still describes
        // the older one until the worker catches up
        stage.submit(frame_w(20));
        stage.submit(frame_w(30));
        let output = stage.latest().unwrap();
        assert_eq!(output.regions[0].label(), Some("w10"));

        // Latest wins once the worker gets there
        wait_for(|| {
            stage
                .latest()
                .map(|o| o.regions[0].label() == Some("w30"))
                .unwrap_or(false)
        })
        .await;

        stage.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_discards_late_results() {
        let stage = InferenceStage::spawn(
            Arc::new(FixedBackend(vec![])),
            InferenceParams::default(),
            fast_config(),
        );

        stage.shutdown();
        stage.submit(frame());
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Worker is stopped and the slot rejects publishes either way
        assert!(stage.latest().is_none());
    }
}
