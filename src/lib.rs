//! # framehub
//!
//! Shared live-video fan-out with asynchronous inference stages.
//!
//! One physical video source is read once and multiplexed to any number
//! of consumers, each running its own paced sampling loop and its own
//! inference stages. Every hand-off between stages is a bounded,
//! latest-wins buffer, so a slow consumer or a slow model can never
//! stall a producer; it just observes staler data.
//!
//! ```text
//!  SourceReader ──► FrameSlot ──► Session ──► InferenceStage ──► results
//!   (1 per source)  (latest wins)  (1 per consumer)  (drop-oldest)    │
//!                                     ▲                               │
//!                                     └───────── latest() ────────────┘
//!                                     │
//!                                     ▼
//!                                 OutputSink
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framehub::hub::StreamHub;
//! use framehub::infer::BackendRegistry;
//! use framehub::session::{Session, SessionConfig, StageSpec};
//! use framehub::sink::ChannelSink;
//!
//! # async fn example(
//! #     source: Arc<dyn framehub::source::FrameSource>,
//! #     backend: Arc<dyn framehub::infer::InferenceBackend>,
//! # ) {
//! let hub = Arc::new(StreamHub::new(source));
//! let mut backends = BackendRegistry::new();
//! backends.register(backend);
//! let backends = Arc::new(backends);
//!
//! // One session per connected consumer
//! let (sink, mut messages) = ChannelSink::new(64);
//! let session = Session::new(
//!     "viewer-1",
//!     SessionConfig::new("rtsp://cam/1").stage(StageSpec::new("yolo11n")),
//!     Arc::clone(&hub),
//!     Arc::clone(&backends),
//!     Box::new(sink),
//! );
//! tokio::spawn(session.run());
//!
//! while let Some(message) = messages.recv().await {
//!     // hand message.to_json() to the transport
//! }
//! # }
//! ```
//!
//! External concerns (codecs, model runtimes, wire transports) enter
//! through the capability traits in [`source`], [`infer`], [`session`]
//! (frame encoding), and [`sink`].

pub mod error;
pub mod frame;
pub mod hub;
pub mod infer;
pub mod relay;
pub mod session;
pub mod sink;
pub mod source;
pub mod stats;

pub use error::{Error, Result};
pub use frame::Frame;
pub use hub::{FrameSlot, HubConfig, HubError, LatestSlot, StreamHub};
pub use infer::{
    BackendRegistry, InferenceBackend, InferenceError, InferenceParams, InferenceStage, Region,
    StageConfig, StageOutput,
};
pub use relay::{LineRelay, RelayConfig};
pub use session::{OutboundMessage, Session, SessionConfig, SessionEnd, SessionOutcome, StageSpec};
pub use sink::{ChannelSink, CloseCode, OutputSink, SinkError};
pub use source::{FrameSource, SourceError, SourceStream};
pub use stats::{RollingRate, SessionStats};
