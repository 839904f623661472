//! Consumer sessions
//!
//! A session is one consumer's independent, paced view onto a shared
//! source plus its chosen inference stages. Sessions are created on
//! connect, run as their own task, and release their subscription
//! exactly once on disconnect or terminal error.

pub mod config;
pub mod encode;
pub mod message;
pub mod runner;

pub use config::{SessionConfig, StageSpec};
pub use encode::{EncodeError, FrameEncoder};
pub use message::{MessageKind, OutboundMessage};
pub use runner::{Session, SessionEnd, SessionOutcome};
