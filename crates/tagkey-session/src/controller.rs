//! The session controller: single source of truth for "is a session
//! running, under which profile, for how long, and can it be ended right
//! now".
//!
//! # Concurrency note
//!
//! `SessionController` is NOT thread-safe by itself. It is owned by one
//! task (the controller actor, see [`spawn_controller`](crate::spawn_controller))
//! and every transition goes through `&mut self`, so no two transitions
//! can interleave.
//!
//! # State machine
//!
//! ```text
//!            start_session(p) / resolve_scan(tag of p)
//!   [Idle] ───────────────────────────────────────────→ [Active(p)] ──┐
//!      ↑                                                    │   tick  │
//!      │   end_session_manually() if !locked                │ ←───────┘
//!      └──────── resolve_scan(tag of p) (even if locked) ───┘
//! ```
//!
//! Lock mode only blocks the manual path. The tag itself is the unlock
//! credential, so scanning it always ends the session.

use tagkey_protocol::{Profile, ProfileId, SessionRecord};

use crate::session::ActiveSession;
use crate::{HistorySink, ProfileLookup, ScanOutcome, SessionSnapshot, format_elapsed};

/// Owns the live session and enforces the lock rules.
pub struct SessionController<H: HistorySink> {
    /// `Some` while a session is running. At most one, ever.
    active: Option<ActiveSession>,

    /// Where finished sessions are handed off.
    history: H,
}

impl<H: HistorySink> SessionController<H> {
    /// Creates an idle controller.
    pub fn new(history: H) -> Self {
        Self {
            active: None,
            history,
        }
    }

    /// Starts a session under a copy of `profile`.
    ///
    /// Returns `false` (and changes nothing) if a session is already
    /// running: starts are rejected, never queued.
    pub fn start_session(&mut self, profile: &Profile) -> bool {
        if let Some(active) = &self.active {
            tracing::debug!(
                active = %active.profile.id,
                requested = %profile.id,
                "start ignored, a session is already active"
            );
            return false;
        }

        let session = ActiveSession::start(profile.clone());
        tracing::info!(
            profile_id = %profile.id,
            profile = %profile.name,
            locked = profile.is_locked(),
            blocked_apps = profile.blocked_app_ids.len(),
            "session started"
        );
        self.active = Some(session);
        true
    }

    /// Advances the elapsed counter by one second.
    ///
    /// Ignored while idle. The actor stops its ticker on the Active→Idle
    /// edge, so this only matters for a stray tick already in flight.
    pub fn tick(&mut self) {
        match &mut self.active {
            Some(active) => {
                active.elapsed_seconds += 1;
                tracing::trace!(elapsed_secs = active.elapsed_seconds, "session tick");
            }
            None => tracing::trace!("tick while idle ignored"),
        }
    }

    /// The in-app "End Session" path.
    ///
    /// Returns `true` if the session ended, `false` if it is locked (only
    /// its tag can end it) or there was nothing to end. A locked session
    /// is an expected outcome, not an error.
    pub fn end_session_manually(&mut self) -> bool {
        match &self.active {
            None => {
                tracing::debug!("manual end ignored, no active session");
                false
            }
            Some(active) if active.profile.is_locked() => {
                tracing::info!(
                    profile_id = %active.profile.id,
                    "manual end refused, session is locked"
                );
                false
            }
            Some(_) => {
                self.finish();
                true
            }
        }
    }

    /// Resolves a scanned identifier into start, end, or ignore.
    ///
    /// - Idle + known profile → starts a session ([`ScanOutcome::Started`]).
    /// - Idle + unknown → [`ScanOutcome::Unrecognized`].
    /// - Active + the active profile's key → ends it, even when locked
    ///   ([`ScanOutcome::Ended`]).
    /// - Active + anything else → [`ScanOutcome::WrongTag`], no change.
    ///
    /// While active, the identifier matches if it is the bound tag or id
    /// recorded when the session started, or if `lookup` currently maps
    /// it to the same profile id. A locked session matches tags only:
    /// its recorded bound tag, or a tag the registry now binds to the
    /// same profile. The recorded key keeps working after the profile
    /// is edited or deleted mid-session.
    pub fn resolve_scan<L>(&mut self, identifier: &str, lookup: &L) -> ScanOutcome
    where
        L: ProfileLookup + ?Sized,
    {
        let Some(active) = &self.active else {
            return match lookup.resolve(identifier) {
                Some(profile) => {
                    self.start_session(&profile);
                    ScanOutcome::Started(profile)
                }
                None => {
                    tracing::debug!(identifier, "scan while idle matched no profile");
                    ScanOutcome::Unrecognized
                }
            };
        };

        // A locked session only accepts tag bindings, never a bare id.
        let current = if active.profile.is_locked() {
            lookup.profile_for_tag(identifier)
        } else {
            lookup.resolve(identifier)
        };
        let matches = active.profile.is_keyed_by(identifier)
            || current.is_some_and(|p| p.id == active.profile.id);

        if matches {
            self.finish();
            ScanOutcome::Ended
        } else {
            tracing::warn!(
                identifier,
                expected = %active.profile.name,
                "wrong tag scanned for active session"
            );
            ScanOutcome::WrongTag {
                expected_profile_name: active.profile.name.clone(),
            }
        }
    }

    /// Whether a session is running.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the running session can only be ended by its tag.
    ///
    /// `false` when idle, and `false` for lock mode without a bound tag:
    /// a lock with no key would strand the user.
    pub fn is_locked(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.profile.is_locked())
    }

    /// Seconds counted in the running session, `0` when idle.
    pub fn current_elapsed_seconds(&self) -> u64 {
        self.active.as_ref().map_or(0, |active| active.elapsed_seconds)
    }

    /// Elapsed time as `MM:SS` or `H:MM:SS`.
    pub fn formatted_elapsed(&self) -> String {
        format_elapsed(self.current_elapsed_seconds())
    }

    /// Id of the profile the running session was started under.
    pub fn active_profile_id(&self) -> Option<&ProfileId> {
        self.active.as_ref().map(|active| &active.profile.id)
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.active {
            Some(active) => SessionSnapshot::Active(active.snapshot()),
            None => SessionSnapshot::Idle,
        }
    }

    /// The history sink.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Ends the running session and hands its record to history.
    ///
    /// `take()` empties the slot before the record is built, so a session
    /// is converted to history exactly once.
    fn finish(&mut self) -> Option<SessionRecord> {
        let session = self.active.take()?;
        let record = session.into_record();
        tracing::info!(
            profile_id = %record.profile_id,
            profile = %record.profile_name,
            elapsed_secs = record.elapsed_seconds,
            "session ended"
        );

        if let Err(e) = self.history.record(record.clone()) {
            tracing::error!(error = %e, profile_id = %record.profile_id, "failed to record session history");
        }
        Some(record)
    }
}

/// The identifier to write on a tag to bind it to `profile`.
///
/// An existing profile's tag carries its id. For a profile still being
/// created (`None`), a fresh id is minted: the caller must save the new
/// profile under this id so the tag and the profile agree. Either way,
/// the binding is only real once the transport acknowledges the write.
pub fn link_tag(profile: Option<&Profile>) -> ProfileId {
    match profile {
        Some(profile) => profile.id.clone(),
        None => ProfileId::generate(),
    }
}

// =========================================================================
// Tests
// =========================================================================
