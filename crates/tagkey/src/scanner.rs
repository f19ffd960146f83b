//! Tag scanner: the scan slot and the payload codec joined together.
//!
//! The transport moves raw bytes and the codec turns them into
//! identifiers. `TagScanner` runs one through the other, inside the
//! slot, so callers deal only in identifiers.

use tagkey_protocol::{EncodeError, PayloadCodec};
use tagkey_transport::{ScanConfig, ScanSlot, ScanTransport};

use crate::TagkeyError;

/// Reads and writes profile identifiers on tags.
#[derive(Debug, Clone)]
pub struct TagScanner<T, C> {
    transport: T,
    codec: C,
    slot: ScanSlot,
}

impl<T, C> TagScanner<T, C>
where
    T: ScanTransport,
    C: PayloadCodec,
{
    pub fn new(transport: T, codec: C, config: ScanConfig) -> Self {
        Self {
            transport,
            codec,
            slot: ScanSlot::new(config),
        }
    }

    /// Waits for a tag and returns the identifier stored on it.
    ///
    /// # Errors
    /// [`TagkeyError::Scan`] if the reader is busy, unavailable, timed out
    /// or was cancelled; [`TagkeyError::Decode`] if the tag holds
    /// something other than a text record.
    pub async fn read_identifier(&self) -> Result<String, TagkeyError> {
        let payload = self.slot.read(&self.transport).await?;
        let identifier = self.codec.decode(&payload).inspect_err(|e| {
            tracing::warn!(error = %e, len = payload.len(), "tag payload could not be decoded");
        })?;
        tracing::debug!(identifier = %identifier, "tag read");
        Ok(identifier)
    }

    /// Writes `identifier` onto the next tag presented.
    ///
    /// Returns only once the transport acknowledged the write.
    ///
    /// # Errors
    /// [`TagkeyError::Encode`] if the identifier does not fit in one
    /// record on this reader (checked before the slot is claimed), or
    /// any [`TagkeyError::Scan`] failure from the write itself.
    pub async fn write_identifier(&self, identifier: &str) -> Result<(), TagkeyError> {
        let payload = self.codec.encode(identifier)?;
        let max = self.transport.max_payload_len();
        if payload.len() > max {
            return Err(EncodeError::IdentifierTooLarge {
                len: payload.len(),
                max,
            }
            .into());
        }

        self.slot.write(&self.transport, &payload).await?;
        tracing::debug!(identifier, len = payload.len(), "tag written");
        Ok(())
    }

    /// Cancels the outstanding scan, if any.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    /// Whether a scan is outstanding.
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Whether the reader can scan right now.
    pub fn is_available(&self) -> bool {
        self.transport.is_available()
    }

    /// The shared scan slot, for wiring a cancel button elsewhere.
    pub fn slot(&self) -> &ScanSlot {
        &self.slot
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
