//! `TagKey`: the service the app talks to.
//!
//! Ties the layers together: transport → codec → controller. One tap
//! either starts the profile on the tag or ends the session it belongs
//! to; linking writes a profile identifier onto a blank tag.

use tagkey_protocol::{PayloadCodec, Profile, ProfileId, TagCodec};
use tagkey_session::{
    ControllerHandle, HistorySink, ProfileLookup, ScanOutcome, SessionSnapshot,
    link_tag, spawn_controller,
};
use tagkey_transport::ScanTransport;

use crate::{TagScanner, TagkeyConfig, TagkeyError};

/// A tag that now carries a profile identifier.
///
/// Returned only after the transport acknowledged the write. Persist
/// `bound_tag_id = tag_id` on the profile (for a new profile, save it
/// under `profile_id`), e.g. with
/// [`ProfileRegistry::bind_tag`](tagkey_session::ProfileRegistry::bind_tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedTag {
    pub profile_id: ProfileId,
    pub tag_id: String,
}

/// Scan-driven session service.
///
/// Cheap to clone when the transport is: clones share the scan slot and
/// the controller.
#[derive(Debug, Clone)]
pub struct TagKey<T, C = TagCodec> {
    scanner: TagScanner<T, C>,
    controller: ControllerHandle,
}

impl<T: ScanTransport> TagKey<T, TagCodec> {
    /// Builds the service with the text-record codec and spawns its
    /// controller actor. Must be called from within a Tokio runtime.
    ///
    /// The codec's payload limit is capped at the transport's.
    pub fn new<H, L>(config: TagkeyConfig, transport: T, history: H, lookup: L) -> Self
    where
        H: HistorySink,
        L: ProfileLookup + Send + Sync + 'static,
    {
        let mut codec_config = config.codec;
        codec_config.max_payload_len = codec_config
            .max_payload_len
            .min(transport.max_payload_len());
        let codec = TagCodec::new(codec_config);
        let scanner = TagScanner::new(transport, codec, config.scan);
        let controller = spawn_controller(config.controller, history, lookup);
        Self::from_parts(scanner, controller)
    }
}

impl<T, C> TagKey<T, C>
where
    T: ScanTransport,
    C: PayloadCodec,
{
    /// Assembles the service from a scanner and a running controller.
    pub fn from_parts(scanner: TagScanner<T, C>, controller: ControllerHandle) -> Self {
        Self {
            scanner,
            controller,
        }
    }

    /// Waits for a tag and lets the controller decide what it means.
    ///
    /// Idle: a known tag starts its profile. Active: the session's own
    /// tag ends it (even when locked); any other tag is
    /// [`ScanOutcome::WrongTag`]. A failed scan changes nothing.
    pub async fn tap(&self) -> Result<ScanOutcome, TagkeyError> {
        let identifier = match self.scanner.read_identifier().await {
            Ok(identifier) => identifier,
            Err(e) => {
                if e.is_cancellation() {
                    tracing::debug!("tap cancelled");
                } else {
                    tracing::warn!(error = %e, "tap failed");
                }
                return Err(e);
            }
        };

        let outcome = self.controller.resolve_scan(identifier).await?;
        tracing::info!(?outcome, "tap resolved");
        Ok(outcome)
    }

    /// Writes a profile identifier onto the next tag presented.
    ///
    /// Pass the profile being linked, or `None` while creating a new
    /// profile; a fresh id is minted then and returned in
    /// [`LinkedTag::profile_id`].
    pub async fn link(&self, profile: Option<&Profile>) -> Result<LinkedTag, TagkeyError> {
        let profile_id = link_tag(profile);
        self.scanner.write_identifier(profile_id.as_str()).await?;

        tracing::info!(profile_id = %profile_id, new = profile.is_none(), "tag linked");
        Ok(LinkedTag {
            tag_id: profile_id.as_str().to_string(),
            profile_id,
        })
    }

    /// Cancels the outstanding tap or link. Returns `true` if one was
    /// pending. The session is not touched.
    pub fn cancel_scan(&self) -> bool {
        self.scanner.cancel()
    }

    /// Whether a tap or link is waiting for a tag.
    pub fn is_scanning(&self) -> bool {
        self.scanner.is_busy()
    }

    /// Whether the device can scan tags at all.
    pub fn can_scan(&self) -> bool {
        self.scanner.is_available()
    }

    /// Starts `profile` without a tag (e.g. from the profile list).
    pub async fn start_session(&self, profile: &Profile) -> Result<bool, TagkeyError> {
        Ok(self.controller.start_session(profile).await?)
    }

    /// The in-app "End Session" button. `Ok(false)` when locked.
    pub async fn end_session_manually(&self) -> Result<bool, TagkeyError> {
        Ok(self.controller.end_session_manually().await?)
    }

    /// Latest published session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.current()
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    pub fn scanner(&self) -> &TagScanner<T, C> {
        &self.scanner
    }
}
