//! Scan transport abstraction for Tagkey.
//!
//! Provides the [`ScanTransport`] trait over tag reader hardware and the
//! [`ScanSlot`] that guarantees at most one scan is outstanding.
//!
//! # Feature Flags
//!
//! - `simulated` (default): scripted in-memory reader, for tests and demos

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "simulated")]
mod simulated;
mod slot;

pub use error::ScanError;
#[cfg(feature = "simulated")]
pub use simulated::{SimulatedTap, SimulatedTransport};
pub use slot::{ScanConfig, ScanGuard, ScanKind, ScanSlot};
pub use tokio_util::sync::CancellationToken;

use std::fmt;

/// Opaque identifier for one scan operation, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(u64);

impl ScanId {
    /// Creates a new `ScanId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

/// Reads and writes raw payloads on proximity tags.
///
/// Implementations perform the blocking hardware interaction out-of-band
/// and resolve once a tag has been handled, the reader failed, or
/// `cancel` fired. They must stop waiting promptly when `cancel` is
/// triggered and return [`ScanError::Cancelled`].
///
/// Callers go through [`ScanSlot`] rather than calling these directly,
/// so the one-scan-at-a-time rule holds.
pub trait ScanTransport: Send + Sync + 'static {
    /// Largest payload a single tag record can hold on this reader.
    fn max_payload_len(&self) -> usize;

    /// Whether a reader is present and usable right now.
    fn is_available(&self) -> bool {
        true
    }

    /// Waits for a tag and returns the payload of its first record.
    async fn read(&self, cancel: CancellationToken) -> Result<Vec<u8>, ScanError>;

    /// Waits for a writable tag and stores `payload` on it.
    ///
    /// `Ok(())` is the write acknowledgment; nothing may assume the tag
    /// was written before this returns.
    async fn write(
        &self,
        payload: &[u8],
        cancel: CancellationToken,
    ) -> Result<(), ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_id_new_and_into_inner() {
        let id = ScanId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_scan_id_display() {
        assert_eq!(ScanId::new(7).to_string(), "scan-7");
    }

    #[test]
    fn test_scan_error_only_cancelled_is_cancellation() {
        assert!(ScanError::Cancelled.is_cancellation());
        assert!(!ScanError::Busy.is_cancellation());
        assert!(!ScanError::Hardware("tag lost".into()).is_cancellation());
        assert!(
            !ScanError::Timeout(std::time::Duration::from_secs(1)).is_cancellation()
        );
    }

    #[test]
    fn test_hardware_error_displays_verbatim() {
        let err = ScanError::Hardware("Tag connection lost".into());
        assert_eq!(err.to_string(), "Tag connection lost");
    }
}
