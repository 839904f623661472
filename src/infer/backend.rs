//! Inference backend capability
//!
//! The boundary to the actual model runtime. The crate never computes
//! detections itself; a backend turns a frame into labeled regions and
//! is expected to be callable repeatedly without reinitialization.

use crate::frame::Frame;

use super::region::Region;

/// Error from an inference backend call
///
/// Capability failures surface as values, never as panics. The stage
/// counts them per session against a retry budget.
#[derive(Debug, Clone)]
pub struct InferenceError {
    /// Name of the backend that failed
    pub backend: String,
    /// What went wrong
    pub message: String,
}

impl InferenceError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "inference failed in {}: {}", self.backend, self.message)
    }
}

impl std::error::Error for InferenceError {}

/// Parameters applied to each inference call
#[derive(Debug, Clone)]
pub struct InferenceParams {
    /// Regions below this confidence are discarded
    pub confidence: f32,

    /// Allow-list of class labels; `None` keeps every class
    ///
    /// Applies to object regions only; recognized text has no class.
    pub classes: Option<Vec<String>>,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            confidence: 0.3,
            classes: None,
        }
    }
}

impl InferenceParams {
    /// Set the confidence floor
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the class allow-list
    pub fn classes(mut self, classes: Vec<String>) -> Self {
        self.classes = Some(classes);
        self
    }

    /// Parse a comma-separated class allow-list
    ///
    /// Blank entries are dropped; an all-blank string means no filter.
    pub fn parse_classes(list: &str) -> Option<Vec<String>> {
        let classes: Vec<String> = list
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if classes.is_empty() {
            None
        } else {
            Some(classes)
        }
    }
}

/// A model runtime that turns frames into labeled regions
///
/// Implementations wrap whatever actually runs the model (an ONNX
/// session, a remote service). Object detectors honor the confidence
/// floor and class filter; text recognizers produce polygon regions and
/// may apply their own confidence floor; the stage enforces both
/// regardless.
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Backend identifier, used for stage/model selection
    fn name(&self) -> &str;

    /// Run inference on one frame
    async fn infer(
        &self,
        frame: &Frame,
        params: &InferenceParams,
    ) -> Result<Vec<Region>, InferenceError>;
}
