//! # Tagkey
//!
//! Tag-keyed focus sessions. Scan a tag to start the profile linked to
//! it; scan the same tag again to end the session. A profile in lock
//! mode can *only* be ended by its tag.
//!
//! The crate wires the layers together:
//!
//! - [`tagkey_transport`]: tag reader abstraction and the one-scan slot
//! - [`tagkey_protocol`]: tag payload codec, profiles, history records
//! - [`tagkey_session`]: the session controller actor and its lock rules
//! - [`tagkey_tick`]: the elapsed-second ticker
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tagkey::prelude::*;
//!
//! # async fn run() -> Result<(), TagkeyError> {
//! let registry = ProfileRegistry::new();
//! let reader = SimulatedTransport::default();
//! let key = TagKey::new(TagkeyConfig::default(), reader, MemoryHistory::new(), registry.clone());
//!
//! let profile = Profile::new("Deep Work").with_lock_mode(true);
//! registry.insert(profile.clone());
//! let linked = key.link(Some(&profile)).await?;
//! registry.bind_tag(&linked.profile_id, linked.tag_id);
//!
//! let outcome = key.tap().await?; // starts "Deep Work"
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod scanner;
mod service;

pub use config::TagkeyConfig;
pub use error::TagkeyError;
pub use scanner::TagScanner;
pub use service::{LinkedTag, TagKey};

pub use tagkey_protocol;
pub use tagkey_session;
pub use tagkey_tick;
pub use tagkey_transport;

/// Everything needed to run a `TagKey`.
pub mod prelude {
    pub use crate::{LinkedTag, TagKey, TagScanner, TagkeyConfig, TagkeyError};
    pub use tagkey_protocol::{
        CodecConfig, PayloadCodec, Profile, ProfileId, SessionRecord, TagCodec,
    };
    pub use tagkey_session::{
        ControllerConfig, ControllerHandle, HistorySink, JsonLinesHistory, MemoryHistory,
        ProfileLookup, ProfileRegistry, ScanOutcome, SessionSnapshot, format_elapsed,
    };
    pub use tagkey_tick::{TickConfig, TickPolicy};
    pub use tagkey_transport::{
        ScanConfig, ScanError, ScanTransport, SimulatedTap, SimulatedTransport,
    };
}
