//! Codec trait and the text-record implementation used on tags.
//!
//! A "codec" (coder/decoder) converts between a profile identifier and
//! the raw bytes stored on a proximity tag. The scan path only needs
//! *something* that implements [`PayloadCodec`], so tests and future tag
//! formats can swap in their own implementation.
//!
//! # Wire format
//!
//! [`TagCodec`] writes a text-record style payload:
//!
//! ```text
//! byte 0        status: bits 0-5 = language code length L, bits 6-7 = 0
//! bytes 1..1+L  language code (e.g. "en"), skipped on read
//! bytes 1+L..   UTF-8 identifier text
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{DecodeError, EncodeError};

/// Mask for the language-code length in the status byte.
const LANG_LEN_MASK: u8 = 0x3F;

/// A codec that maps profile identifiers to tag payloads and back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the codec is shared between the scanner and the
///   controller tasks.
/// - `'static` → it owns everything it needs, so it can live inside
///   long-lived async tasks.
pub trait PayloadCodec: Send + Sync + 'static {
    /// Builds the payload to write on a tag for `identifier`.
    ///
    /// # Errors
    /// Returns [`EncodeError::IdentifierTooLarge`] if the payload would
    /// not fit in one tag record.
    fn encode(&self, identifier: &str) -> Result<Vec<u8>, EncodeError>;

    /// Extracts the identifier from a payload read off a tag.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] for truncated or non-UTF-8 payloads.
    /// Must never panic, whatever the input.
    fn decode(&self, payload: &[u8]) -> Result<String, DecodeError>;
}

// ---------------------------------------------------------------------------
// CodecConfig
// ---------------------------------------------------------------------------

/// Configuration for [`TagCodec`].
///
/// The record size limit belongs to the transport (different tag chips
/// hold different amounts of data), so it is passed in here rather than
/// baked into the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Language code written after the status byte. Not used on read.
    pub language_code: String,

    /// Maximum total payload size in bytes.
    pub max_payload_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            language_code: "en".to_string(),
            max_payload_len: 512,
        }
    }
}

impl CodecConfig {
    /// Longest language code the status byte can describe.
    pub const MAX_LANGUAGE_CODE_LEN: usize = LANG_LEN_MASK as usize;

    /// Creates a config with the given payload limit and the default
    /// language code.
    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        Self {
            max_payload_len,
            ..Default::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TagCodec::new`]. A language code longer
    /// than 63 bytes is truncated on a character boundary.
    pub fn validated(mut self) -> Self {
        if self.language_code.len() > Self::MAX_LANGUAGE_CODE_LEN {
            warn!(
                len = self.language_code.len(),
                max = Self::MAX_LANGUAGE_CODE_LEN,
                "language code exceeds status byte range, truncating"
            );
            let mut end = Self::MAX_LANGUAGE_CODE_LEN;
            while !self.language_code.is_char_boundary(end) {
                end -= 1;
            }
            self.language_code.truncate(end);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// TagCodec
// ---------------------------------------------------------------------------

/// The text-record [`PayloadCodec`].
///
/// Stateless apart from its configuration: the same input always yields
/// the same output, and decoding returns the text exactly as stored (no
/// case folding or trimming; identifier equality is the caller's call).
///
/// ## Example
///
/// ```rust
/// use tagkey_protocol::{CodecConfig, PayloadCodec, TagCodec};
///
/// let codec = TagCodec::new(CodecConfig::default());
/// let payload = codec.encode("3f2b9c1e-profile").unwrap();
/// assert_eq!(payload[0], 2); // "en"
/// assert_eq!(codec.decode(&payload).unwrap(), "3f2b9c1e-profile");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TagCodec {
    config: CodecConfig,
}

impl TagCodec {
    /// Creates a codec from config.
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    /// The maximum payload size this codec will produce.
    pub fn max_payload_len(&self) -> usize {
        self.config.max_payload_len
    }

    /// The language code written into every payload.
    pub fn language_code(&self) -> &str {
        &self.config.language_code
    }
}

impl PayloadCodec for TagCodec {
    fn encode(&self, identifier: &str) -> Result<Vec<u8>, EncodeError> {
        let lang = self.config.language_code.as_bytes();
        let len = 1 + lang.len() + identifier.len();
        if len > self.config.max_payload_len {
            return Err(EncodeError::IdentifierTooLarge {
                len,
                max: self.config.max_payload_len,
            });
        }

        let mut payload = Vec::with_capacity(len);
        // High two bits stay zero; `validated` guarantees the length fits.
        payload.push(lang.len() as u8 & LANG_LEN_MASK);
        payload.extend_from_slice(lang);
        payload.extend_from_slice(identifier.as_bytes());
        Ok(payload)
    }

    fn decode(&self, payload: &[u8]) -> Result<String, DecodeError> {
        // `split_first` gives us the status byte and the rest without
        // any indexing that could panic on an empty slice.
        let (status, rest) = match payload.split_first() {
            Some((status, rest)) if !rest.is_empty() => (*status, rest),
            _ => {
                return Err(DecodeError::TooShort {
                    len: payload.len(),
                    needed: 2,
                });
            }
        };

        let lang_len = (status & LANG_LEN_MASK) as usize;
        // `get` returns None instead of panicking when the language code
        // runs past the end of the payload.
        let text = rest.get(lang_len..).ok_or(DecodeError::TooShort {
            len: payload.len(),
            needed: 1 + lang_len,
        })?;

        std::str::from_utf8(text)
            .map(str::to_owned)
            .map_err(DecodeError::InvalidEncoding)
    }
}
