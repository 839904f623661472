//! Latest-value slot
//!
//! A single-item mailbox with "latest wins" semantics: publishing
//! overwrites whatever is there, reading never waits for freshness.
//! This is the only buffering discipline between a source reader and
//! its consumers: a slow consumer can never hold back a fast producer,
//! it simply observes fewer of the values.

use std::sync::Mutex;

use crate::frame::Frame;

/// Slot holding raw video frames
pub type FrameSlot = LatestSlot<Frame>;

struct SlotState<T> {
    value: Option<T>,
    active: bool,
}

/// Single-item, overwrite-on-publish, non-blocking-read buffer
///
/// `publish` and `latest` never block beyond the brief interior lock,
/// which is never held across an await point. After `deactivate`, any
/// publish from a racing producer task is a no-op, which is what keeps
/// teardown safe while a reader is still mid-iteration.
pub struct LatestSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T: Clone> LatestSlot<T> {
    /// Create an empty, active slot
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: None,
                active: true,
            }),
        }
    }

    /// Overwrite the slot with a new value
    ///
    /// No-op if the slot has been deactivated.
    pub fn publish(&self, value: T) {
        let mut state = self.state.lock().unwrap();
        if state.active {
            state.value = Some(value);
        }
    }

    /// Read the most recently published value, if any
    ///
    /// Returns a clone; never blocks, never waits for a publish.
    /// Returns `None` when nothing has been published or the slot has
    /// been deactivated.
    pub fn latest(&self) -> Option<T> {
        self.state.lock().unwrap().value.clone()
    }

    /// Clear the slot and reject all further publishes
    pub fn deactivate(&self) {
        let mut state = self.state.lock().unwrap();
        state.active = false;
        state.value = None;
    }

    /// Whether the slot still accepts publishes
    pub fn is_active(&self) -> bool {
        self.state.lock().unwrap().active
    }
}

impl<T: Clone> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_returns_none() {
        let slot: LatestSlot<u32> = LatestSlot::new();
        assert_eq!(slot.latest(), None);
    }

    #[test]
    fn test_publish_overwrites() {
        let slot = LatestSlot::new();
        slot.publish(1u32);
        slot.publish(2);
        slot.publish(3);

        assert_eq!(slot.latest(), Some(3));
        // Reading does not consume
        assert_eq!(slot.latest(), Some(3));
    }

    #[test]
    fn test_deactivate_clears_and_blocks_publish() {
        let slot = LatestSlot::new();
        slot.publish(7u32);
        slot.deactivate();

        assert_eq!(slot.latest(), None);
        assert!(!slot.is_active());

        // Publish after deactivation is a no-op
        slot.publish(8);
        assert_eq!(slot.latest(), None);
    }

    #[tokio::test]
    async fn test_concurrent_publish_and_read() {
        use std::sync::Arc;

        let slot = Arc::new(LatestSlot::new());
        let writer = Arc::clone(&slot);

        let handle = tokio::spawn(async move {
            for i in 0..1000u32 {
                writer.publish(i);
            }
        });

        // Reads observe either nothing or some published value, never
        // a torn state
        for _ in 0..1000 {
            if let Some(v) = slot.latest() {
                assert!(v < 1000);
            }
        }

        handle.await.unwrap();
        assert_eq!(slot.latest(), Some(999));
    }
}
