//! Crate-level error types
//!
//! Each component defines its own narrow error enum; this module ties
//! them together for callers that drive the whole pipeline. The split
//! mirrors the failure policy: connection errors are retried, decode
//! errors are discarded, inference errors are budgeted per session,
//! capacity errors are rejected synchronously, and delivery errors tear
//! the session down.

use crate::hub::HubError;
use crate::infer::InferenceError;
use crate::sink::SinkError;
use crate::source::SourceError;

/// Convenience result type for framehub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any error the crate can surface
#[derive(Debug)]
pub enum Error {
    /// Video source failure
    Source(SourceError),
    /// Hub subscription failure
    Hub(HubError),
    /// Inference backend failure
    Inference(InferenceError),
    /// Outbound delivery failure
    Sink(SinkError),
    /// Underlying I/O failure
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Source(e) => write!(f, "{}", e),
            Error::Hub(e) => write!(f, "{}", e),
            Error::Inference(e) => write!(f, "{}", e),
            Error::Sink(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Source(e) => Some(e),
            Error::Hub(e) => Some(e),
            Error::Inference(e) => Some(e),
            Error::Sink(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Error::Source(e)
    }
}

impl From<HubError> for Error {
    fn from(e: HubError) -> Self {
        Error::Hub(e)
    }
}

impl From<InferenceError> for Error {
    fn from(e: InferenceError) -> Self {
        Error::Inference(e)
    }
}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Error::Sink(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_preserve_detail() {
        let e: Error = SourceError::Connection("refused".into()).into();
        assert!(e.to_string().contains("refused"));

        let e: Error = HubError::Capacity {
            source: "camA".into(),
            limit: 5,
        }
        .into();
        assert!(e.to_string().contains("camA"));

        let e: Error = InferenceError::new("yolo11n", "oom").into();
        assert!(e.to_string().contains("yolo11n"));

        let e: Error = SinkError::Closed.into();
        assert!(e.to_string().contains("closed"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as _;

        let e: Error = SinkError::Delivery("tcp reset".into()).into();
        assert!(e.source().is_some());
    }
}
