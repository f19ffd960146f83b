//! The pending-scan slot: one outstanding scan at a time.
//!
//! A tag reader can only talk to one tag at once, and two overlapping
//! scans would race for the same physical tap. [`ScanSlot`] enforces the
//! rule itself instead of trusting callers: a second request while a scan
//! is pending is rejected with [`ScanError::Busy`].
//!
//! # Lifecycle
//!
//! ```text
//! begin() ──→ [Pending] ──(transport resolves)──→ guard dropped ──→ [Empty]
//!                 │
//!                 └──(cancel() / timeout)──→ token fired ──→ [Empty]
//! ```
//!
//! The slot is cleared by the [`ScanGuard`]'s `Drop`, so a scan future
//! dropped mid-flight also frees it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{ScanError, ScanId, ScanTransport};

/// Counter for generating unique scan IDs.
static NEXT_SCAN_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

/// Configuration for scans issued through a [`ScanSlot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How long to wait for a tag before giving up. `None` waits until
    /// cancelled.
    pub timeout: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

// ---------------------------------------------------------------------------
// ScanKind / PendingScan
// ---------------------------------------------------------------------------

/// What the outstanding scan is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Identify a tag: start, end, or check a session.
    Read,
    /// Link a tag: write a profile identifier onto it.
    Write,
}

#[derive(Debug)]
struct PendingScan {
    id: ScanId,
    kind: ScanKind,
    cancel: CancellationToken,
}

// ---------------------------------------------------------------------------
// ScanSlot
// ---------------------------------------------------------------------------

/// Holds at most one pending scan.
///
/// Cheap to clone; clones share the same slot, so a UI "Cancel" button
/// can hold one clone while the scan runs through another.
#[derive(Debug, Clone, Default)]
pub struct ScanSlot {
    pending: Arc<Mutex<Option<PendingScan>>>,
    config: ScanConfig,
}

impl ScanSlot {
    /// Creates an empty slot.
    pub fn new(config: ScanConfig) -> Self {
        Self {
            pending: Arc::default(),
            config,
        }
    }

    /// Claims the slot for a new scan.
    ///
    /// # Errors
    /// Returns [`ScanError::Busy`] if a scan is already pending.
    pub fn begin(&self, kind: ScanKind) -> Result<ScanGuard, ScanError> {
        let mut pending = self.lock();
        if let Some(existing) = pending.as_ref() {
            debug!(
                pending = %existing.id,
                pending_kind = ?existing.kind,
                requested = ?kind,
                "scan rejected, another scan is pending"
            );
            return Err(ScanError::Busy);
        }

        let id = ScanId::new(NEXT_SCAN_ID.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        *pending = Some(PendingScan {
            id,
            kind,
            cancel: cancel.clone(),
        });
        debug!(%id, ?kind, "scan started");

        Ok(ScanGuard {
            id,
            kind,
            cancel,
            pending: Arc::clone(&self.pending),
        })
    }

    /// Cancels the pending scan, if any.
    ///
    /// Fires the scan's cancellation token (which the transport observes)
    /// and clears the slot immediately, so nothing is left waiting for a
    /// response that will never arrive. Returns `true` if a scan was
    /// pending.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(scan) => {
                scan.cancel.cancel();
                info!(id = %scan.id, kind = ?scan.kind, "scan cancelled");
                true
            }
            None => false,
        }
    }

    /// The kind of the pending scan, or `None` when idle.
    pub fn pending(&self) -> Option<ScanKind> {
        self.lock().as_ref().map(|scan| scan.kind)
    }

    /// Whether a scan is outstanding.
    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }

    /// Reads one tag through `transport`.
    ///
    /// # Errors
    /// - [`ScanError::Unavailable`]: no reader; the slot is not touched
    /// - [`ScanError::Busy`]: another scan is pending
    /// - [`ScanError::Cancelled`] / [`ScanError::Timeout`]
    /// - any error the transport reports
    pub async fn read<T: ScanTransport>(&self, transport: &T) -> Result<Vec<u8>, ScanError> {
        if !transport.is_available() {
            return Err(ScanError::Unavailable);
        }
        let guard = self.begin(ScanKind::Read)?;
        let token = guard.token();
        guard.run(transport.read(token), self.config.timeout).await
    }

    /// Writes `payload` onto one tag through `transport`.
    ///
    /// `Ok(())` means the transport acknowledged the write.
    ///
    /// # Errors
    /// Same as [`read`](Self::read).
    pub async fn write<T: ScanTransport>(
        &self,
        transport: &T,
        payload: &[u8],
    ) -> Result<(), ScanError> {
        if !transport.is_available() {
            return Err(ScanError::Unavailable);
        }
        let guard = self.begin(ScanKind::Write)?;
        let token = guard.token();
        guard.run(transport.write(payload, token), self.config.timeout).await
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingScan>> {
        // The slot holds no invariants a panic could break halfway.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// ScanGuard
// ---------------------------------------------------------------------------

/// Proof that the slot is claimed. Releases the slot on drop.
#[derive(Debug)]
pub struct ScanGuard {
    id: ScanId,
    kind: ScanKind,
    cancel: CancellationToken,
    pending: Arc<Mutex<Option<PendingScan>>>,
}

impl ScanGuard {
    /// The scan's id.
    pub fn id(&self) -> ScanId {
        self.id
    }

    /// What this scan is doing.
    pub fn kind(&self) -> ScanKind {
        self.kind
    }

    /// A clone of the scan's cancellation token, for the transport.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drives `scan` to completion, racing it against cancellation and
    /// the optional timeout. Consumes the guard, releasing the slot.
    pub async fn run<F, R>(self, scan: F, timeout: Option<Duration>) -> Result<R, ScanError>
    where
        F: Future<Output = Result<R, ScanError>>,
    {
        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScanError::Cancelled),
            result = scan => result,
            _ = deadline => {
                // Propagate to the transport before the future is dropped.
                self.cancel.cancel();
                Err(ScanError::Timeout(timeout.unwrap_or_default()))
            }
        };

        match &result {
            Ok(_) => debug!(id = %self.id, kind = ?self.kind, "scan completed"),
            Err(e) => debug!(id = %self.id, kind = ?self.kind, error = %e, "scan failed"),
        }
        result
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        // Only clear our own entry: after `cancel()` the slot may already
        // hold a newer scan.
        if pending.as_ref().is_some_and(|scan| scan.id == self.id) {
            *pending = None;
        }
    }
}
