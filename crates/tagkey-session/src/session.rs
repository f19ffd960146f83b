//! Session types: live state, read-only snapshots, and scan outcomes.
//!
//! A "session" is one timed interval under a profile. While it runs the
//! controller keeps an [`ActiveSession`] holding its own copy of the
//! profile; everyone else only ever sees a [`SessionSnapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tagkey_protocol::{Profile, ProfileId, SessionRecord};
use tagkey_tick::TickConfig;

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// Configuration for the controller actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Elapsed-time ticker settings. One tick = one elapsed second.
    pub tick: TickConfig,

    /// Capacity of the command channel. Senders wait when it is full.
    pub channel_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            channel_size: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// ActiveSession
// ---------------------------------------------------------------------------

/// The live session, owned exclusively by the controller.
///
/// `profile` is a copy taken at start: edits to (or deletion of) the
/// registry's profile while the session runs cannot rebind it or change
/// its lock.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSession {
    pub(crate) profile: Profile,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) elapsed_seconds: u64,
}

impl ActiveSession {
    pub(crate) fn start(profile: Profile) -> Self {
        Self {
            profile,
            started_at: Utc::now(),
            elapsed_seconds: 0,
        }
    }

    /// Converts the session into its history record. Consumes `self`, so
    /// a session can only ever produce one record.
    pub(crate) fn into_record(self) -> SessionRecord {
        SessionRecord {
            started_at: self.started_at,
            ended_at: Utc::now(),
            profile_id: self.profile.id,
            profile_name: self.profile.name,
            blocked_app_ids: self.profile.blocked_app_ids.into_iter().collect(),
            elapsed_seconds: self.elapsed_seconds,
        }
    }

    pub(crate) fn snapshot(&self) -> ActiveSnapshot {
        ActiveSnapshot {
            profile_id: self.profile.id.clone(),
            profile_name: self.profile.name.clone(),
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds,
            locked: self.profile.is_locked(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Read-only view of a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSnapshot {
    pub profile_id: ProfileId,
    pub profile_name: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    /// Whether only the profile's tag can end this session.
    pub locked: bool,
}

/// Read-only view of the controller's state, for the UI to poll or
/// subscribe to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionSnapshot {
    #[default]
    Idle,
    Active(ActiveSnapshot),
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// `0` when idle.
    pub fn elapsed_seconds(&self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::Active(active) => active.elapsed_seconds,
        }
    }

    /// `false` when idle.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Active(active) if active.locked)
    }

    pub fn formatted_elapsed(&self) -> String {
        format_elapsed(self.elapsed_seconds())
    }
}

// ---------------------------------------------------------------------------
// ScanOutcome
// ---------------------------------------------------------------------------

/// What a tag scan did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The controller was idle and the tag named a known profile; a
    /// session is now running under (a copy of) it.
    Started(Profile),
    /// The tag matched the active session's profile; the session ended.
    Ended,
    /// A session is running and the tag is not its key. Nothing changed.
    WrongTag { expected_profile_name: String },
    /// The controller was idle and no profile matches the tag.
    Unrecognized,
}

impl ScanOutcome {
    /// Feedback line for the user, or `None` when the outcome speaks for
    /// itself.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Started(_) => Some("Profile activated!".to_string()),
            Self::Ended => Some("Session ended.".to_string()),
            Self::WrongTag {
                expected_profile_name,
            } => Some(format!(
                "Wrong tag. Scan the \"{expected_profile_name}\" tag to end this session."
            )),
            Self::Unrecognized => {
                Some("This tag isn't linked to any profile.".to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Formats a second count as `MM:SS`, or `H:MM:SS` once an hour has
/// passed. Hours are not padded.
///
/// ```rust
/// use tagkey_session::format_elapsed;
///
/// assert_eq!(format_elapsed(45), "00:45");
/// assert_eq!(format_elapsed(3725), "1:02:05");
/// ```
pub fn format_elapsed(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
