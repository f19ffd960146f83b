//! Error types for the session layer.
//!
//! Lock violations, wrong tags and unknown tags are *not* errors here:
//! they are ordinary outcomes ([`ScanOutcome`](crate::ScanOutcome), a
//! `false` from a manual end). What remains are failures of the
//! machinery around the state machine.

/// Errors that can occur when talking to the controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The controller actor has stopped (shut down or its task ended),
    /// so the command could not be delivered or answered.
    #[error("session controller is unavailable")]
    ControllerUnavailable,
}

/// Errors a [`HistorySink`](crate::HistorySink) can report.
///
/// The controller logs these and carries on: a failed history write
/// never keeps a session from ending.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The underlying writer failed.
    #[error("history write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("history record could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}
