use std::time::Duration;

/// Errors that can occur in the scan transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Another scan is already outstanding.
    #[error("a scan is already in progress")]
    Busy,

    /// The scan was cancelled, by the user or by the caller.
    #[error("scan cancelled")]
    Cancelled,

    /// No tag was presented before the deadline.
    #[error("scan timed out after {0:?}")]
    Timeout(Duration),

    /// The device has no usable tag reader.
    #[error("tag scanning is not available on this device")]
    Unavailable,

    /// A tag was presented but carries no record at all.
    #[error("tag has no data")]
    EmptyTag,

    /// The reader reported a failure.
    #[error("{0}")]
    Hardware(String),
}

impl ScanError {
    /// Whether this is a cancellation rather than a real failure.
    ///
    /// Cancellations are expected (the user dismissed the scan sheet) and
    /// should not be surfaced as errors.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
