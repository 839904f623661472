//! Per-source state held by the hub

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::slot::FrameSlot;

/// State for one shared source while it has subscribers
///
/// The invariant the hub maintains: an entry exists in the map iff its
/// refcount is greater than zero, and its reader task is running iff
/// the entry exists. Teardown removes the entry, clears the run flag,
/// and deactivates the slot in one critical section.
pub(super) struct SourceEntry {
    /// Shared latest-frame slot for this source
    pub slot: Arc<FrameSlot>,

    /// Number of active subscribers
    pub subscribers: u32,

    /// Run flag observed by the reader once per iteration
    pub running: Arc<AtomicBool>,

    /// When the reader was started
    pub started_at: Instant,
}

impl SourceEntry {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(FrameSlot::new()),
            subscribers: 0,
            running: Arc::new(AtomicBool::new(true)),
            started_at: Instant::now(),
        }
    }

    /// Signal the reader to stop and shut the slot
    pub fn tear_down(&self) {
        self.running.store(false, Ordering::Release);
        self.slot.deactivate();
    }
}

/// Snapshot of one source's state
#[derive(Debug, Clone)]
pub struct SourceStats {
    /// Number of active subscribers
    pub subscribers: u32,
    /// Whether the reader task is (still) signalled to run
    pub running: bool,
    /// How long the source has been open
    pub uptime: std::time::Duration,
}
