//! Scripted in-memory tag reader.
//!
//! Each scan consumes the next scripted [`SimulatedTap`]. With nothing
//! scripted, a scan waits (like a reader with no tag nearby) until a tap
//! is queued or the scan is cancelled.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::{ScanError, ScanTransport};

/// One scripted user interaction with the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedTap {
    /// A tag holding this payload is presented. Reads return the payload;
    /// writes overwrite it and succeed.
    Tag(Vec<u8>),
    /// A tag with no record is presented. Reads fail with
    /// [`ScanError::EmptyTag`]; writes succeed.
    BlankTag,
    /// The reader reports a failure with this message.
    Fail(String),
    /// The user dismisses the scan.
    UserCancel,
}

#[derive(Debug)]
struct SimState {
    taps: VecDeque<SimulatedTap>,
    written: Vec<Vec<u8>>,
    available: bool,
}

/// A [`ScanTransport`] driven by a queue of scripted taps.
///
/// Clones share the same script, so a test can keep one clone to queue
/// taps while the code under test owns another.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    state: Arc<Mutex<SimState>>,
    tapped: Arc<Notify>,
    max_payload_len: usize,
}

impl SimulatedTransport {
    /// Creates an available reader with an empty script.
    pub fn new(max_payload_len: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                taps: VecDeque::new(),
                written: Vec::new(),
                available: true,
            })),
            tapped: Arc::new(Notify::new()),
            max_payload_len,
        }
    }

    /// Queues the next interaction.
    pub fn push(&self, tap: SimulatedTap) {
        self.lock().taps.push_back(tap);
        self.tapped.notify_one();
    }

    /// Queues a tag holding `payload`.
    pub fn present(&self, payload: impl Into<Vec<u8>>) {
        self.push(SimulatedTap::Tag(payload.into()));
    }

    /// Turns the reader on or off.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Every payload acknowledged by [`ScanTransport::write`], in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// Number of scripted taps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock().taps.len()
    }

    async fn next_tap(&self, cancel: &CancellationToken) -> Result<SimulatedTap, ScanError> {
        loop {
            if let Some(tap) = self.lock().taps.pop_front() {
                return Ok(tap);
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                _ = self.tapped.notified() => {}
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(512)
    }
}

impl ScanTransport for SimulatedTransport {
    fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    fn is_available(&self) -> bool {
        self.lock().available
    }

    async fn read(&self, cancel: CancellationToken) -> Result<Vec<u8>, ScanError> {
        match self.next_tap(&cancel).await? {
            SimulatedTap::Tag(payload) => {
                tracing::debug!(len = payload.len(), "simulated tag read");
                Ok(payload)
            }
            SimulatedTap::BlankTag => Err(ScanError::EmptyTag),
            SimulatedTap::Fail(message) => Err(ScanError::Hardware(message)),
            SimulatedTap::UserCancel => Err(ScanError::Cancelled),
        }
    }

    async fn write(
        &self,
        payload: &[u8],
        cancel: CancellationToken,
    ) -> Result<(), ScanError> {
        match self.next_tap(&cancel).await? {
            SimulatedTap::Tag(_) | SimulatedTap::BlankTag => {
                if payload.len() > self.max_payload_len {
                    return Err(ScanError::Hardware("payload exceeds tag capacity".into()));
                }
                self.lock().written.push(payload.to_vec());
                tracing::debug!(len = payload.len(), "simulated tag written");
                Ok(())
            }
            SimulatedTap::Fail(message) => Err(ScanError::Hardware(message)),
            SimulatedTap::UserCancel => Err(ScanError::Cancelled),
        }
    }
}
