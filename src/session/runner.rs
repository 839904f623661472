//! Session loop
//!
//! One session is one consumer's paced view onto a shared source. It
//! samples the latest frame at its own rate, feeds its inference
//! stages, composes result messages from whatever results are newest,
//! and keeps the consumer informed with heartbeats and status messages.
//! Teardown runs exactly once no matter which failure signal arrives
//! first.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::time::Instant;

use crate::hub::StreamHub;
use crate::infer::{BackendRegistry, InferenceStage, Region, StageOutput};
use crate::sink::{CloseCode, OutputSink, SinkError};
use crate::stats::SessionStats;

use super::config::SessionConfig;
use super::encode::FrameEncoder;
use super::message::OutboundMessage;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The consumer went away
    Disconnected,
    /// The inference retry budget was exhausted
    RetryBudget,
    /// Rejected at subscribe time: source at capacity
    Capacity,
    /// Rejected at setup: unknown model name
    UnknownModel,
}

/// Result of running a session to completion
#[derive(Debug, Clone, Copy)]
pub struct SessionOutcome {
    /// Why the loop ended
    pub end: SessionEnd,
    /// Close code handed to the sink
    pub close: CloseCode,
    /// Counters accumulated over the session
    pub stats: SessionStats,
}

/// One consumer's paced sampling loop
pub struct Session {
    id: String,
    config: SessionConfig,
    hub: Arc<StreamHub>,
    backends: Arc<BackendRegistry>,
    encoder: Option<Arc<dyn FrameEncoder>>,
    sink: Box<dyn OutputSink>,
}

impl Session {
    /// Create a session; nothing runs until [`run`](Self::run)
    pub fn new(
        id: impl Into<String>,
        config: SessionConfig,
        hub: Arc<StreamHub>,
        backends: Arc<BackendRegistry>,
        sink: Box<dyn OutputSink>,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            hub,
            backends,
            encoder: None,
            sink,
        }
    }

    /// Set the frame encoder producing image payloads
    pub fn encoder(mut self, encoder: Arc<dyn FrameEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Drive the session until the consumer disconnects or a terminal
    /// error occurs
    ///
    /// Subscribes on entry and unsubscribes exactly once on every exit
    /// path; a capacity rejection closes the sink with the distinct
    /// capacity code and touches no refcount.
    pub async fn run(mut self) -> SessionOutcome {
        // Resolve stages before touching the hub, so a bad model name
        // never costs a refcount
        let mut resolved = Vec::with_capacity(self.config.stages.len());
        for spec in &self.config.stages {
            match self.backends.get(&spec.model) {
                Some(backend) => resolved.push((backend, spec.params.clone())),
                None => {
                    tracing::warn!(session = %self.id, model = %spec.model, "Unknown model");
                    let msg =
                        OutboundMessage::error(format!("model {} is not registered", spec.model));
                    let _ = self.sink.send(&msg).await;
                    self.sink.close(CloseCode::Error).await;
                    return SessionOutcome {
                        end: SessionEnd::UnknownModel,
                        close: CloseCode::Error,
                        stats: SessionStats::default(),
                    };
                }
            }
        }

        let slot = match self.hub.subscribe(&self.config.source_id).await {
            Ok(slot) => slot,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Subscribe rejected");
                let _ = self.sink.send(&OutboundMessage::error(e.to_string())).await;
                self.sink.close(CloseCode::CapacityExceeded).await;
                return SessionOutcome {
                    end: SessionEnd::Capacity,
                    close: CloseCode::CapacityExceeded,
                    stats: SessionStats::default(),
                };
            }
        };

        tracing::info!(
            session = %self.id,
            source = %self.config.source_id,
            stages = resolved.len(),
            fps = self.config.target_fps,
            "Session started"
        );

        let stages: Vec<InferenceStage> = resolved
            .into_iter()
            .map(|(backend, params)| {
                InferenceStage::spawn(backend, params, self.config.stage_config.clone())
            })
            .collect();

        let connected = OutboundMessage::status(
            "connected",
            format!("subscribed to {}", self.config.source_id),
        );
        let mut stats = SessionStats::default();

        let end = if self.sink.send(&connected).await.is_err() {
            SessionEnd::Disconnected
        } else {
            self.drive(&slot, &stages, &mut stats).await
        };

        // Single teardown path: stop the stages, release exactly one
        // refcount, close the sink
        for stage in &stages {
            stage.shutdown();
        }
        self.hub.unsubscribe(&self.config.source_id).await;

        let close = match end {
            SessionEnd::Disconnected => CloseCode::Normal,
            _ => CloseCode::Error,
        };
        self.sink.close(close).await;

        tracing::info!(
            session = %self.id,
            end = ?end,
            frames = stats.frames,
            empty_reads = stats.empty_reads,
            heartbeats = stats.heartbeats,
            overruns = stats.overruns,
            errors = stats.errors,
            "Session ended"
        );

        SessionOutcome { end, close, stats }
    }

    /// The paced loop proper; returns why it stopped
    async fn drive(
        &mut self,
        slot: &crate::hub::FrameSlot,
        stages: &[InferenceStage],
        stats: &mut SessionStats,
    ) -> SessionEnd {
        let period = self.config.sample_period();
        let mut next_tick = Instant::now() + period;
        let mut last_heartbeat = Instant::now();
        let mut empty_count: u32 = 0;
        let mut reported_failures: u32 = 0;

        loop {
            tokio::time::sleep_until(next_tick).await;
            let iter_start = Instant::now();
            next_tick = iter_start + period;

            // Heartbeat cadence is independent of message traffic
            if iter_start.duration_since(last_heartbeat) >= self.config.heartbeat_interval {
                stats.heartbeats += 1;
                last_heartbeat = iter_start;
                if let Err(e) = self.sink.send(&OutboundMessage::heartbeat()).await {
                    return self.on_sink_error(e);
                }
            }

            // Inference failures observed since the last iteration
            let failures = stages
                .iter()
                .map(|s| s.consecutive_failures())
                .max()
                .unwrap_or(0);
            if failures >= self.config.max_retries && self.config.max_retries > 0 {
                stats.errors += 1;
                let detail = stages
                    .iter()
                    .filter(|s| s.consecutive_failures() >= self.config.max_retries)
                    .find_map(|s| s.last_error())
                    .unwrap_or_else(|| "inference failed".to_string());
                let msg = OutboundMessage::processing_error(detail, failures);
                let _ = self.sink.send(&msg).await;
                return SessionEnd::RetryBudget;
            }
            if failures > reported_failures {
                stats.errors += u64::from(failures - reported_failures);
                let detail = stages
                    .iter()
                    .find_map(|s| s.last_error())
                    .unwrap_or_else(|| "inference failed".to_string());
                reported_failures = failures;
                if let Err(e) = self
                    .sink
                    .send(&OutboundMessage::processing_error(detail, failures))
                    .await
                {
                    return self.on_sink_error(e);
                }
            } else if failures == 0 {
                reported_failures = 0;
            }

            // Sample the shared slot; absence never terminates the
            // session, it only slows it down past the threshold
            let Some(frame) = slot.latest() else {
                empty_count += 1;
                stats.empty_reads += 1;
                if empty_count == self.config.empty_frame_threshold {
                    let msg =
                        OutboundMessage::error("repeatedly failed to read a frame, still retrying");
                    if let Err(e) = self.sink.send(&msg).await {
                        return self.on_sink_error(e);
                    }
                }
                if let Err(e) = self.sink.send(&OutboundMessage::empty_frame(empty_count)).await {
                    return self.on_sink_error(e);
                }
                if empty_count >= self.config.empty_frame_threshold {
                    tracing::warn!(
                        session = %self.id,
                        empty_reads = empty_count,
                        "No frames from source, stalling"
                    );
                    tokio::time::sleep(self.config.empty_frame_stall).await;
                }
                continue;
            };
            empty_count = 0;

            for stage in stages {
                if stage.submit(frame.clone()) {
                    stats.dropped_submissions += 1;
                }
            }

            // Compose from whatever results are newest; they may lag the
            // frame just submitted
            let outputs: Vec<StageOutput> = stages.iter().filter_map(|s| s.latest()).collect();
            let regions: Vec<Region> = outputs
                .iter()
                .flat_map(|o| o.regions.iter().cloned())
                .collect();
            let inference_time = outputs.first().map(|o| o.inference_time.as_secs_f64());

            let image_base64 = match &self.encoder {
                Some(encoder) => match encoder.encode(&frame, &regions) {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        stats.errors += 1;
                        tracing::warn!(session = %self.id, error = %e, "Encode failed");
                        if let Err(e) = self
                            .sink
                            .send(&OutboundMessage::processing_error(e.to_string(), 0))
                            .await
                        {
                            return self.on_sink_error(e);
                        }
                        continue;
                    }
                },
                None => None,
            };

            let mut classes: BTreeMap<String, u32> = BTreeMap::new();
            for region in &regions {
                if let Some(label) = region.label() {
                    *classes.entry(label.to_string()).or_insert(0) += 1;
                }
            }
            let object_count = classes.values().map(|&n| n as usize).sum();

            let message = OutboundMessage {
                image_base64,
                inference_time,
                processing_time: Some(iter_start.elapsed().as_secs_f64()),
                fps: Some(self.config.target_fps),
                object_count: Some(object_count),
                classes: Some(classes),
                timestamp: Some(frame.unix_timestamp()),
                ..Default::default()
            };

            if let Err(e) = self.sink.send(&message).await {
                return self.on_sink_error(e);
            }
            stats.frames += 1;

            // The loop never drops frames to catch up; it just runs
            // behind schedule and records that it did
            let elapsed = iter_start.elapsed();
            if elapsed > period {
                stats.overruns += 1;
                tracing::warn!(
                    session = %self.id,
                    processing_ms = elapsed.as_millis() as u64,
                    period_ms = period.as_millis() as u64,
                    "Iteration overran the sample period"
                );
            }
        }
    }

    fn on_sink_error(&self, e: SinkError) -> SessionEnd {
        tracing::info!(session = %self.id, error = %e, "Consumer gone");
        SessionEnd::Disconnected
    }
}
