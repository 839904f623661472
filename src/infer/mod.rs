//! Asynchronous inference stages
//!
//! A stage is a bounded drop-oldest queue feeding one worker task that
//! calls an external model backend and publishes its results into a
//! latest-wins slot. Producers are never blocked: when the model is
//! slower than the sample rate, old submissions are displaced and old
//! results are overwritten.
//!
//! ```text
//!   Session ──submit()──► SubmitQueue(2, drop-oldest)
//!                              │
//!                              ▼ recv_timeout()
//!                          [worker task] ──infer()──► backend
//!                              │
//!                              ▼ publish()
//!                       LatestSlot<StageOutput> ◄──latest()── Session
//! ```

pub mod backend;
pub mod queue;
pub mod region;
pub mod registry;
pub mod stage;

pub use backend::{InferenceBackend, InferenceError, InferenceParams};
pub use queue::SubmitQueue;
pub use region::{Point, Rect, Region};
pub use registry::BackendRegistry;
pub use stage::{InferenceStage, StageConfig, StageOutput};
