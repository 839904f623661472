//! Frame encoding capability
//!
//! Turning a raw frame plus its regions into the image payload carried
//! by a result message is codec work, which stays outside the crate.
//! Implementations typically draw the regions and emit a base64 data
//! URL.

use crate::frame::Frame;
use crate::infer::Region;

/// Error encoding a frame for delivery
#[derive(Debug, Clone)]
pub struct EncodeError(pub String);

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame encoding failed: {}", self.0)
    }
}

impl std::error::Error for EncodeError {}

/// Produces the outbound image payload for a frame and its regions
pub trait FrameEncoder: Send + Sync {
    /// Annotate and encode one frame
    fn encode(&self, frame: &Frame, regions: &[Region]) -> Result<String, EncodeError>;
}
