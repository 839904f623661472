//! Hub error types

/// Error type for hub operations
#[derive(Debug, Clone)]
pub enum HubError {
    /// The per-source subscriber limit would be exceeded
    ///
    /// Rejected synchronously at subscribe time; the caller is never
    /// queued waiting for a slot to free.
    Capacity {
        /// The source that is at capacity
        source: String,
        /// The configured limit
        limit: u32,
    },
}

impl std::fmt::Display for HubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubError::Capacity { source, limit } => {
                write!(f, "source {} is at its subscriber limit ({})", source, limit)
            }
        }
    }
}

impl std::error::Error for HubError {}
