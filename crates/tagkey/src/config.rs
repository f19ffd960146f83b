//! Top-level configuration.

use serde::{Deserialize, Serialize};
use tagkey_protocol::CodecConfig;
use tagkey_session::ControllerConfig;
use tagkey_transport::ScanConfig;

use crate::TagkeyError;

/// Everything a [`TagKey`](crate::TagKey) needs besides its collaborators.
///
/// Missing fields fall back to their defaults at every level, so `{}`
/// is a valid document:
///
/// ```rust
/// use tagkey::TagkeyConfig;
///
/// let config = TagkeyConfig::from_json(r#"{ "codec": { "language_code": "de" } }"#).unwrap();
/// assert_eq!(config.codec.language_code, "de");
/// assert_eq!(config.scan, Default::default());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagkeyConfig {
    /// Tag payload format.
    pub codec: CodecConfig,

    /// Scan timeout.
    pub scan: ScanConfig,

    /// Controller actor and elapsed ticker.
    pub controller: ControllerConfig,
}

impl TagkeyConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, TagkeyError> {
        let config: Self = serde_json::from_str(json)?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, TagkeyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(TagkeyConfig::from_json("{}").unwrap(), TagkeyConfig::default());
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let mut config = TagkeyConfig::default();
        config.scan.timeout = None;
        config.controller.channel_size = 4;
        config.controller.tick.interval = Duration::from_millis(250);

        let parsed = TagkeyConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_nested_sections_fill_in_defaults() {
        let config = TagkeyConfig::from_json(
            r#"{ "codec": { "language_code": "de" }, "controller": { "tick": {} } }"#,
        )
        .unwrap();

        assert_eq!(config.codec.language_code, "de");
        assert_eq!(config.codec.max_payload_len, CodecConfig::default().max_payload_len);
        assert_eq!(config.controller, ControllerConfig::default());
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let err = TagkeyConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TagkeyError::Config(_)));
    }
}
