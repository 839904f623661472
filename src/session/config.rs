//! Session configuration

use std::time::Duration;

use crate::infer::{InferenceParams, StageConfig};

/// One inference stage a session wants to run
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Backend name to resolve in the registry
    pub model: String,
    /// Per-call parameters for this stage
    pub params: InferenceParams,
}

impl StageSpec {
    /// A stage for `model` with default parameters
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            params: InferenceParams::default(),
        }
    }

    /// Set the stage parameters
    pub fn params(mut self, params: InferenceParams) -> Self {
        self.params = params;
        self
    }
}

/// Configuration for one consumer session
///
/// Carries the client-facing subscription parameters (source, model,
/// confidence, class allow-list, sample rate) plus the pacing and retry
/// discipline the loop runs with.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Source id to subscribe to
    pub source_id: String,

    /// Inference stages to run, first is the primary
    pub stages: Vec<StageSpec>,

    /// Target sample rate in frames per second
    pub target_fps: f64,

    /// Quiet interval after which a heartbeat is emitted
    pub heartbeat_interval: Duration,

    /// Consecutive empty reads before the loop stalls briefly
    pub empty_frame_threshold: u32,

    /// How long to stall once the empty-frame threshold is reached
    pub empty_frame_stall: Duration,

    /// Consecutive inference failures that terminate the session
    pub max_retries: u32,

    /// Queue and poll settings applied to every spawned stage
    pub stage_config: StageConfig,
}

impl SessionConfig {
    /// Config for `source_id` with the documented defaults
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            stages: Vec::new(),
            target_fps: 1.0,
            heartbeat_interval: Duration::from_secs(30),
            empty_frame_threshold: 10,
            empty_frame_stall: Duration::from_secs(1),
            max_retries: 3,
            stage_config: StageConfig::default(),
        }
    }

    /// Add an inference stage
    pub fn stage(mut self, spec: StageSpec) -> Self {
        self.stages.push(spec);
        self
    }

    /// Set the target sample rate (floored at a small positive rate)
    pub fn target_fps(mut self, fps: f64) -> Self {
        self.target_fps = if fps > 0.0 { fps } else { 1.0 };
        self
    }

    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the empty-frame threshold
    pub fn empty_frame_threshold(mut self, threshold: u32) -> Self {
        self.empty_frame_threshold = threshold;
        self
    }

    /// Set the empty-frame stall duration
    pub fn empty_frame_stall(mut self, stall: Duration) -> Self {
        self.empty_frame_stall = stall;
        self
    }

    /// Set the inference retry budget
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the stage queue and poll settings
    pub fn stage_config(mut self, stage_config: StageConfig) -> Self {
        self.stage_config = stage_config;
        self
    }

    /// The sample period implied by the target rate
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let config = SessionConfig::new("camA");

        assert_eq!(config.source_id, "camA");
        assert_eq!(config.target_fps, 1.0);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.empty_frame_threshold, 10);
        assert_eq!(config.empty_frame_stall, Duration::from_secs(1));
        assert_eq!(config.max_retries, 3);
        assert!(config.stages.is_empty());
    }

    #[test]
    fn test_sample_period() {
        let config = SessionConfig::new("camA").target_fps(4.0);
        assert_eq!(config.sample_period(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_fps_is_rejected() {
        let config = SessionConfig::new("camA").target_fps(0.0);
        assert_eq!(config.target_fps, 1.0);

        let config = SessionConfig::new("camA").target_fps(-2.0);
        assert_eq!(config.target_fps, 1.0);
    }

    #[test]
    fn test_stage_specs() {
        let config = SessionConfig::new("camA")
            .stage(StageSpec::new("yolo11n").params(
                InferenceParams::default()
                    .confidence(0.5)
                    .classes(vec!["person".to_string()]),
            ))
            .stage(StageSpec::new("ocr-v5"));

        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[0].model, "yolo11n");
        assert_eq!(config.stages[0].params.confidence, 0.5);
        assert_eq!(config.stages[1].model, "ocr-v5");
    }
}
