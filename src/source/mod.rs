//! Video source capability
//!
//! The boundary to whatever actually decodes video: an RTSP client, a
//! capture device, a file reader. The crate never touches codecs itself;
//! it drives implementations of these traits from
//! [`SourceReader`](crate::hub::SourceReader) and expects them to
//! tolerate being reopened after a failure.

use crate::frame::Frame;

/// Error from a video source
#[derive(Debug, Clone)]
pub enum SourceError {
    /// The source is unreachable or the connection dropped
    ///
    /// Retried indefinitely by the reader while demand exists.
    Connection(String),
    /// A record was received but could not be decoded
    ///
    /// The record is discarded and the stream continues.
    Decode(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Connection(msg) => write!(f, "source connection error: {}", msg),
            SourceError::Decode(msg) => write!(f, "source decode error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Factory for opening video sources by id
///
/// One provider is shared by every reader the hub spawns. `open` is
/// called again after each connection-level failure, so implementations
/// must not assume a single open per source.
#[async_trait::async_trait]
pub trait FrameSource: Send + Sync {
    /// Open the source identified by `id`
    async fn open(&self, id: &str) -> Result<Box<dyn SourceStream>, SourceError>;
}

/// An open video stream
///
/// Dropping the stream releases the underlying connection.
#[async_trait::async_trait]
pub trait SourceStream: Send {
    /// Read the next frame
    ///
    /// Returns `Ok(Some(frame))` on a decoded frame, `Ok(None)` on end of
    /// stream, and `Err` on a connection or decode failure.
    async fn read(&mut self) -> Result<Option<Frame>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = SourceError::Connection("refused".into());
        assert_eq!(e.to_string(), "source connection error: refused");

        let e = SourceError::Decode("bad nal".into());
        assert_eq!(e.to_string(), "source decode error: bad nal");
    }
}
