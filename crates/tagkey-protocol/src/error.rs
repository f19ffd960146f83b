//! Error types for the protocol layer.
//!
//! Encoding and decoding fail for different reasons and are handled by
//! different callers (the link path encodes, the scan path decodes), so
//! each direction gets its own enum. Both are always recoverable: a
//! failed decode is an unreadable tag, never a crash.

/// Errors that can occur while building a tag payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The encoded payload would not fit in a single tag record.
    ///
    /// `len` is the size the payload would have had; `max` is the
    /// transport's record limit the codec was configured with.
    #[error("identifier too large: payload would be {len} bytes, limit is {max}")]
    IdentifierTooLarge { len: usize, max: usize },
}

/// Errors that can occur while reading a tag payload.
///
/// Foreign tags (written by other apps, blank, or damaged) land here.
/// The controller never sees these. The scan is reported as unreadable
/// and no state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload ends before the text field begins.
    ///
    /// Covers empty and single-byte payloads as well as a status byte
    /// that announces a language code longer than the remaining bytes.
    #[error("payload too short: {len} bytes, need at least {needed}")]
    TooShort { len: usize, needed: usize },

    /// The text field is not valid UTF-8.
    #[error("payload text is not valid UTF-8: {0}")]
    InvalidEncoding(#[source] std::str::Utf8Error),
}
