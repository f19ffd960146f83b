//! Unified error type for Tagkey.

use tagkey_protocol::{DecodeError, EncodeError};
use tagkey_session::SessionError;
use tagkey_transport::ScanError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tagkey` crate you deal with this single error type
/// instead of importing errors from each sub-crate. `?` converts them.
///
/// None of these change session state: a failed scan leaves the
/// controller exactly where it was.
#[derive(Debug, thiserror::Error)]
pub enum TagkeyError {
    /// The reader failed, timed out, was busy, or the scan was cancelled.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A tag was read but its payload is not a text record we understand.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The identifier does not fit on the tag.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The session controller could not be reached.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl TagkeyError {
    /// Whether the user dismissed the scan. Nothing went wrong.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Scan(e) if e.is_cancellation())
    }

    /// Text to show the user, or `None` when nothing should be shown.
    ///
    /// Cancellation is silent. Reader failures are passed through as the
    /// reader worded them.
    pub fn user_message(&self) -> Option<String> {
        let msg = match self {
            Self::Scan(ScanError::Cancelled) => return None,
            Self::Scan(ScanError::EmptyTag) => {
                "This tag has no Tagkey data. Link it to a profile first.".to_string()
            }
            Self::Scan(e) => e.to_string(),
            Self::Decode(DecodeError::TooShort { .. }) => "Unreadable tag.".to_string(),
            Self::Decode(DecodeError::InvalidEncoding(_)) => "Could not decode tag.".to_string(),
            Self::Encode(EncodeError::IdentifierTooLarge { .. }) => {
                "This tag is too small to hold a Tagkey profile.".to_string()
            }
            Self::Session(e) => e.to_string(),
            Self::Config(e) => e.to_string(),
        };
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scan_error() {
        let err: TagkeyError = ScanError::Hardware("Tag connection lost".into()).into();
        assert!(matches!(err, TagkeyError::Scan(_)));
        assert_eq!(err.to_string(), "Tag connection lost");
    }

    #[test]
    fn test_cancellation_has_no_user_message() {
        let err: TagkeyError = ScanError::Cancelled.into();
        assert!(err.is_cancellation());
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn test_hardware_message_is_verbatim() {
        let err: TagkeyError = ScanError::Hardware("Tag connection lost".into()).into();
        assert_eq!(err.user_message().as_deref(), Some("Tag connection lost"));
    }

    #[test]
    fn test_empty_tag_message() {
        let err: TagkeyError = ScanError::EmptyTag.into();
        assert_eq!(
            err.user_message().as_deref(),
            Some("This tag has no Tagkey data. Link it to a profile first.")
        );
    }

    #[test]
    fn test_decode_errors_are_unreadable() {
        let short: TagkeyError = DecodeError::TooShort { len: 1, needed: 2 }.into();
        assert_eq!(short.user_message().as_deref(), Some("Unreadable tag."));
        assert!(!short.is_cancellation());

        let utf8_err = std::str::from_utf8(&[0xFF]).unwrap_err();
        let bad: TagkeyError = DecodeError::InvalidEncoding(utf8_err).into();
        assert_eq!(bad.user_message().as_deref(), Some("Could not decode tag."));
    }

    #[test]
    fn test_from_session_error() {
        let err: TagkeyError = SessionError::ControllerUnavailable.into();
        assert!(matches!(err, TagkeyError::Session(_)));
        assert!(err.user_message().is_some());
    }
}
