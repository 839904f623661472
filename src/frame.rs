//! Captured video frames
//!
//! A [`Frame`] is an opaque pixel buffer plus capture metadata. The pixel
//! data lives in a `bytes::Bytes`, so cloning a frame is a reference-count
//! bump rather than a copy, so every slot read hands out a cheap clone and
//! nothing ever mutates a frame in place.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// A single captured video frame
///
/// Immutable once constructed. Readers of a
/// [`FrameSlot`](crate::hub::FrameSlot) receive clones that share the
/// underlying pixel allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Opaque pixel data (layout is the source's concern)
    pub data: Bytes,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// When the frame was captured
    pub captured_at: SystemTime,
}

impl Frame {
    /// Create a frame captured now
    pub fn new(data: Bytes, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            captured_at: SystemTime::now(),
        }
    }

    /// Create a frame with an explicit capture time
    pub fn with_captured_at(
        data: Bytes,
        width: u32,
        height: u32,
        captured_at: SystemTime,
    ) -> Self {
        Self {
            data,
            width,
            height,
            captured_at,
        }
    }

    /// Capture time as fractional seconds since the Unix epoch
    ///
    /// Clamps to 0.0 for capture times before the epoch.
    pub fn unix_timestamp(&self) -> f64 {
        self.captured_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Size of the pixel payload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the pixel payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let frame = Frame::new(Bytes::from_static(&[1, 2, 3, 4]), 2, 2);
        let copy = frame.clone();

        // Bytes clones share the same allocation
        assert_eq!(frame.data.as_ptr(), copy.data.as_ptr());
        assert_eq!(copy.width, 2);
        assert_eq!(copy.len(), 4);
    }

    #[test]
    fn test_unix_timestamp_is_fractional_seconds() {
        let frame = Frame::new(Bytes::new(), 0, 0);
        let ts = frame.unix_timestamp();

        // Sanity: after 2020-01-01, before year 3000
        assert!(ts > 1_577_836_800.0);
        assert!(ts < 32_503_680_000.0);
    }

    #[test]
    fn test_explicit_capture_time() {
        let at = UNIX_EPOCH + std::time::Duration::from_millis(1500);
        let frame = Frame::with_captured_at(Bytes::new(), 0, 0, at);

        assert!((frame.unix_timestamp() - 1.5).abs() < 1e-9);
    }
}
