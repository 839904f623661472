//! Stream hub: one upstream reader shared by many sessions
//!
//! The hub owns the map from source id to the reader/slot pair serving
//! it, gated by a subscriber refcount. Readers exist exactly while
//! demand exists.
//!
//! # Architecture
//!
//! ```text
//!                           Arc<StreamHub>
//!                    ┌───────────────────────────┐
//!                    │ sources: HashMap<id,      │
//!                    │   SourceEntry {           │
//!                    │     slot: Arc<FrameSlot>, │
//!                    │     subscribers,          │
//!                    │     running: AtomicBool,  │
//!                    │   }                       │
//!                    │ >                         │
//!                    └────────────┬──────────────┘
//!                                 │
//!          ┌──────────────────────┼──────────────────────┐
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//!     [SourceReader]          [Session]              [Session]
//!     slot.publish()          slot.latest()          slot.latest()
//! ```
//!
//! # Latest-wins buffering
//!
//! Each source has exactly one [`FrameSlot`]: publishing overwrites,
//! reading never blocks. A session that samples slower than the source
//! produces simply skips frames; a session that samples faster sees the
//! same frame twice. Neither ever stalls the reader. Frame payloads are
//! `bytes::Bytes`, so every consumer shares one allocation.

pub mod config;
pub mod entry;
pub mod error;
pub mod reader;
pub mod slot;
pub mod store;

pub use config::HubConfig;
pub use entry::SourceStats;
pub use error::HubError;
pub use reader::{ReaderState, SourceReader};
pub use slot::{FrameSlot, LatestSlot};
pub use store::StreamHub;
