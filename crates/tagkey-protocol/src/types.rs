//! Shared data model: profile identifiers, profiles, and session records.
//!
//! These are plain values. The controller copies a [`Profile`] when a
//! session starts and hands a [`SessionRecord`] to the history layer when
//! it ends, so nothing here is ever shared mutably between layers.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProfileId
// ---------------------------------------------------------------------------

/// A unique identifier for a block profile.
///
/// Newtype over `String`: identifiers come off tags as arbitrary text, so
/// the controller treats them as opaque. Identifiers minted locally by
/// [`ProfileId::generate`] are canonical UUID text (version 4).
///
/// `#[serde(transparent)]` keeps the JSON form a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Wraps an existing identifier as-is.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random identifier.
    ///
    /// Used when a tag is linked before its profile is saved: the same
    /// value becomes the profile's id and the tag payload.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Self(uuid.hyphenated().to_string())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProfileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A named set of apps to restrict, optionally bound to a physical tag.
///
/// Owned by the profile registry. The controller only ever reads a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable for the profile's lifetime.
    pub id: ProfileId,

    /// Display name, shown in "wrong tag" feedback and copied into history.
    pub name: String,

    /// Opaque app identifiers (bundle ids, package names, ...).
    ///
    /// A `BTreeSet` rather than a `HashSet` so snapshots serialize in a
    /// stable order.
    pub blocked_app_ids: BTreeSet<String>,

    /// When `true`, only scanning the bound tag can end a session.
    pub lock_mode: bool,

    /// The identifier written on the linked tag. `None` = no tag linked.
    pub bound_tag_id: Option<String>,
}

impl Profile {
    /// Creates an unlocked, untagged profile with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ProfileId::generate(), name)
    }

    /// Creates an unlocked, untagged profile with the given id.
    pub fn with_id(id: impl Into<ProfileId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            blocked_app_ids: BTreeSet::new(),
            lock_mode: false,
            bound_tag_id: None,
        }
    }

    /// Adds an app to the blocked set.
    pub fn blocking(mut self, app_id: impl Into<String>) -> Self {
        self.blocked_app_ids.insert(app_id.into());
        self
    }

    /// Turns lock mode on or off.
    pub fn with_lock_mode(mut self, lock_mode: bool) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    /// Records the identifier written on this profile's tag.
    pub fn bound_to(mut self, tag_id: impl Into<String>) -> Self {
        self.bound_tag_id = Some(tag_id.into());
        self
    }

    /// Whether a session under this profile can only be ended by a tag.
    ///
    /// Lock mode without a bound tag does NOT lock: a lock with no key
    /// would strand the user inside their own session.
    pub fn is_locked(&self) -> bool {
        self.lock_mode && self.bound_tag_id.is_some()
    }

    /// Whether `identifier` is this profile's key.
    ///
    /// A locked profile is keyed only by its bound tag. Otherwise the
    /// bound tag or the profile id both count.
    pub fn is_keyed_by(&self, identifier: &str) -> bool {
        let by_tag = self.bound_tag_id.as_deref() == Some(identifier);
        if self.is_locked() {
            by_tag
        } else {
            by_tag || self.id.as_str() == identifier
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// Immutable history record for one completed session.
///
/// Built by value when the session ends. The profile name and blocked
/// apps are copies, so editing or deleting the profile later cannot
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Id of the profile the session ran under, for correlation only.
    pub profile_id: ProfileId,
    pub profile_name: String,
    pub blocked_app_ids: Vec<String>,
    /// Ticks counted while the session was active.
    pub elapsed_seconds: u64,
}

impl SessionRecord {
    /// Wall-clock length of the session.
    pub fn duration(&self) -> TimeDelta {
        self.ended_at - self.started_at
    }
}
