//! Profile lookup: how the controller finds the profile a tag names.
//!
//! Profiles are owned by persistence, outside this crate. The controller
//! only needs two questions answered ("which profile has this id?" and
//! "which profile is this tag bound to?"), so that is all the
//! [`ProfileLookup`] trait asks for. Lookups return owned copies: the
//! controller never holds a reference into the registry.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tagkey_protocol::{Profile, ProfileId};

/// Finds profiles by id or by tag binding.
pub trait ProfileLookup {
    /// The profile with this id, if any.
    fn profile(&self, id: &str) -> Option<Profile>;

    /// The profile whose `bound_tag_id` equals `tag_id`, if any.
    fn profile_for_tag(&self, tag_id: &str) -> Option<Profile>;

    /// The profile a scanned identifier refers to.
    ///
    /// Tag bindings win over ids; identifiers are compared exactly as
    /// read off the tag.
    fn resolve(&self, identifier: &str) -> Option<Profile> {
        self.profile_for_tag(identifier)
            .or_else(|| self.profile(identifier))
    }
}

impl<L: ProfileLookup + ?Sized> ProfileLookup for &L {
    fn profile(&self, id: &str) -> Option<Profile> {
        (**self).profile(id)
    }

    fn profile_for_tag(&self, tag_id: &str) -> Option<Profile> {
        (**self).profile_for_tag(tag_id)
    }
}

/// A plain list of profiles, e.g. whatever the UI last queried.
impl ProfileLookup for [Profile] {
    fn profile(&self, id: &str) -> Option<Profile> {
        self.iter().find(|p| p.id.as_str() == id).cloned()
    }

    fn profile_for_tag(&self, tag_id: &str) -> Option<Profile> {
        self.iter()
            .find(|p| p.bound_tag_id.as_deref() == Some(tag_id))
            .cloned()
    }
}

impl ProfileLookup for Vec<Profile> {
    fn profile(&self, id: &str) -> Option<Profile> {
        self.as_slice().profile(id)
    }

    fn profile_for_tag(&self, tag_id: &str) -> Option<Profile> {
        self.as_slice().profile_for_tag(tag_id)
    }
}

// ---------------------------------------------------------------------------
// ProfileRegistry
// ---------------------------------------------------------------------------

/// In-memory profile store.
///
/// Cheap to clone; clones share the same profiles, so the UI can edit a
/// registry while the controller actor reads another clone of it.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    /// `BTreeMap` keeps iteration (and so tag lookups) deterministic.
    profiles: Arc<RwLock<BTreeMap<ProfileId, Profile>>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile. Returns the previous version.
    pub fn insert(&self, profile: Profile) -> Option<Profile> {
        tracing::debug!(profile_id = %profile.id, name = %profile.name, "profile saved");
        self.write().insert(profile.id.clone(), profile)
    }

    /// Deletes a profile. A session already running under it keeps going.
    pub fn remove(&self, id: &ProfileId) -> Option<Profile> {
        let removed = self.write().remove(id);
        if removed.is_some() {
            tracing::debug!(profile_id = %id, "profile deleted");
        }
        removed
    }

    /// Returns a copy of the profile with this id.
    pub fn get(&self, id: &ProfileId) -> Option<Profile> {
        self.read().get(id).cloned()
    }

    /// Records that `tag_id` was written to a tag for profile `id`.
    ///
    /// Call only after the transport acknowledged the write. A physical
    /// tag carries one identifier, so any other profile bound to the
    /// same tag loses its binding. Returns `false` if the profile does
    /// not exist.
    pub fn bind_tag(&self, id: &ProfileId, tag_id: impl Into<String>) -> bool {
        let tag_id = tag_id.into();
        let mut profiles = self.write();
        if !profiles.contains_key(id) {
            return false;
        }

        for (other_id, other) in profiles.iter_mut() {
            if other_id != id && other.bound_tag_id.as_deref() == Some(tag_id.as_str()) {
                tracing::info!(profile_id = %other_id, tag_id = %tag_id, "tag re-linked, clearing old binding");
                other.bound_tag_id = None;
            }
        }
        if let Some(profile) = profiles.get_mut(id) {
            profile.bound_tag_id = Some(tag_id);
        }
        true
    }

    /// Copies of all profiles, ordered by id.
    pub fn list(&self) -> Vec<Profile> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ProfileId, Profile>> {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ProfileId, Profile>> {
        self.profiles.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProfileLookup for ProfileRegistry {
    fn profile(&self, id: &str) -> Option<Profile> {
        self.read().get(&ProfileId::new(id)).cloned()
    }

    fn profile_for_tag(&self, tag_id: &str) -> Option<Profile> {
        self.read()
            .values()
            .find(|p| p.bound_tag_id.as_deref() == Some(tag_id))
            .cloned()
    }
}
