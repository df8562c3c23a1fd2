use heapless::Vec;

use crate::{
    config::PROFILE_CAPACITY,
    types::{NetworkProfile, ProfileId},
};

/// Ordered configuration store the selector iterates over.
pub trait ProfileStore {
    /// All profiles in store order.
    fn profiles(&self) -> &[NetworkProfile];

    fn mark_temporarily_disabled(&mut self, id: ProfileId, until_ms: u64) -> bool;

    fn clear_temporary_disable(&mut self, id: ProfileId) -> bool;

    fn enabled_profiles(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles().iter().filter(|profile| profile.enabled)
    }

    fn profile(&self, id: ProfileId) -> Option<&NetworkProfile> {
        self.profiles().iter().find(|profile| profile.id == id)
    }

    fn enabled_count(&self) -> usize {
        self.enabled_profiles().count()
    }

    /// Clears disable windows that have run out. Returns how many were cleared.
    fn sweep_expired_disables(&mut self, now_ms: u64) -> usize {
        let expired: Vec<ProfileId, PROFILE_CAPACITY> = self
            .profiles()
            .iter()
            .filter(|profile| profile.disabled_until_ms.is_some_and(|until| now_ms >= until))
            .map(|profile| profile.id)
            .take(PROFILE_CAPACITY)
            .collect();
        for id in &expired {
            self.clear_temporary_disable(*id);
        }
        expired.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileTableError {
    Full,
    DuplicateId,
}

impl ProfileTableError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "profile table full",
            Self::DuplicateId => "duplicate profile id",
        }
    }
}

impl core::fmt::Display for ProfileTableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-capacity profile store.
#[derive(Clone, Debug, Default)]
pub struct ProfileTable {
    profiles: Vec<NetworkProfile, PROFILE_CAPACITY>,
}

impl ProfileTable {
    pub const fn new() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    pub fn insert(&mut self, profile: NetworkProfile) -> Result<(), ProfileTableError> {
        if self.profiles.iter().any(|existing| existing.id == profile.id) {
            return Err(ProfileTableError::DuplicateId);
        }
        self.profiles
            .push(profile)
            .map_err(|_| ProfileTableError::Full)
    }

    pub fn remove(&mut self, id: ProfileId) -> Option<NetworkProfile> {
        let idx = self.profiles.iter().position(|profile| profile.id == id)?;
        Some(self.profiles.remove(idx))
    }

    pub fn profile_mut(&mut self, id: ProfileId) -> Option<&mut NetworkProfile> {
        self.profiles.iter_mut().find(|profile| profile.id == id)
    }

    pub fn set_enabled(&mut self, id: ProfileId, enabled: bool) -> bool {
        match self.profile_mut(id) {
            Some(profile) => {
                profile.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileStore for ProfileTable {
    fn profiles(&self) -> &[NetworkProfile] {
        &self.profiles
    }

    fn mark_temporarily_disabled(&mut self, id: ProfileId, until_ms: u64) -> bool {
        match self.profile_mut(id) {
            Some(profile) => {
                profile.disabled_until_ms = Some(until_ms);
                true
            }
            None => false,
        }
    }

    fn clear_temporary_disable(&mut self, id: ProfileId) -> bool {
        match self.profile_mut(id) {
            Some(profile) => profile.disabled_until_ms.take().is_some(),
            None => false,
        }
    }
}
