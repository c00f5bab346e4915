//! The call group registry: player -> groups -> members.
//!
//! Pure data plus invariant-preserving mutation operations. The registry has
//! no I/O awareness; the engine holds it behind a lock and persists it after
//! every successful mutation.
//!
//! Invariants:
//! - player names are unique across the registry
//! - group names are unique within a player
//! - faction refs (by tag) and person refs are unique within a group
//! - every new player entry is seeded with the two default groups

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::value_objects::{FactionRef, GroupName, MemberKind, PlayerName};

/// Groups seeded into every new player entry, in seeding order.
///
/// The UI labels these "predefined", but the registry itself does not protect
/// them from removal; that policy lives in plugin configuration.
pub const DEFAULT_GROUPS: [&str; 2] = ["Friendly", "Neutral"];

// ============================================================================
// CallGroup
// ============================================================================

/// A named set of faction and person references owned by one player.
///
/// Both member lists preserve insertion order for display; uniqueness is
/// enforced by the mutation methods, not by the collection type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGroup {
    name: GroupName,
    factions: Vec<FactionRef>,
    persons: Vec<PlayerName>,
}

impl CallGroup {
    /// Create an empty group.
    pub fn new(name: GroupName) -> Self {
        Self {
            name,
            factions: Vec::new(),
            persons: Vec::new(),
        }
    }

    pub fn name(&self) -> &GroupName {
        &self.name
    }

    pub fn factions(&self) -> &[FactionRef] {
        &self.factions
    }

    pub fn persons(&self) -> &[PlayerName] {
        &self.persons
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty() && self.persons.is_empty()
    }

    /// Add a faction reference. Returns false when a reference with the same
    /// tag is already present (re-adding is a harmless no-op).
    pub fn add_faction(&mut self, fref: FactionRef) -> bool {
        if self.factions.iter().any(|f| f.tag() == fref.tag()) {
            return false;
        }
        self.factions.push(fref);
        true
    }

    /// Add a person reference. Returns false when already present.
    pub fn add_person(&mut self, person: PlayerName) -> bool {
        if self.persons.contains(&person) {
            return false;
        }
        self.persons.push(person);
        true
    }

    /// Remove a member from the named side only.
    ///
    /// Factions match on the canonical `"TAG - Name"` form or the bare tag;
    /// persons match on the exact display name. Returns whether an entry was
    /// removed.
    pub fn remove_member(&mut self, kind: MemberKind, needle: &str) -> bool {
        match kind {
            MemberKind::Faction => {
                let before = self.factions.len();
                self.factions.retain(|f| !f.matches(needle));
                self.factions.len() != before
            }
            MemberKind::Person => {
                let before = self.persons.len();
                self.persons.retain(|p| p.as_str() != needle);
                self.persons.len() != before
            }
        }
    }
}

// ============================================================================
// PlayerEntry
// ============================================================================

/// One player's ordered collection of call groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    name: PlayerName,
    groups: Vec<CallGroup>,
}

impl PlayerEntry {
    /// Create an entry seeded with the default groups.
    ///
    /// Seeding happens on the value before it is inserted into a registry, so
    /// a partially-initialized player can never be observed.
    pub fn with_default_groups(name: PlayerName) -> Self {
        let groups = DEFAULT_GROUPS
            .iter()
            .filter_map(|g| GroupName::new(*g).ok())
            .map(CallGroup::new)
            .collect();
        Self { name, groups }
    }

    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    pub fn groups(&self) -> &[CallGroup] {
        &self.groups
    }

    /// Exact-name group lookup.
    pub fn group(&self, group_name: &str) -> Option<&CallGroup> {
        self.groups.iter().find(|g| g.name() == group_name)
    }

    pub fn group_mut(&mut self, group_name: &str) -> Option<&mut CallGroup> {
        self.groups.iter_mut().find(|g| *g.name() == *group_name)
    }

    /// Add an empty group. Fails when the name is already taken.
    pub fn add_group(&mut self, group_name: GroupName) -> Result<(), RegistryError> {
        if self.group(group_name.as_str()).is_some() {
            return Err(RegistryError::GroupExists(group_name.as_str().to_string()));
        }
        self.groups.push(CallGroup::new(group_name));
        Ok(())
    }

    /// Remove a group by name. Silent no-op (false) when absent.
    pub fn remove_group(&mut self, group_name: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.name() != group_name);
        self.groups.len() != before
    }
}

// ============================================================================
// CallGroupRegistry
// ============================================================================

/// The full player -> group -> member hierarchy.
///
/// Loaded once at session start and held in memory for the process lifetime;
/// every mutation is re-persisted synchronously by the owning service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGroupRegistry {
    players: Vec<PlayerEntry>,
}

impl CallGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[PlayerEntry] {
        &self.players
    }

    /// Exact-name player lookup.
    pub fn find_player(&self, name: &str) -> Option<&PlayerEntry> {
        self.players.iter().find(|p| p.name() == name)
    }

    pub fn find_player_mut(&mut self, name: &str) -> Option<&mut PlayerEntry> {
        self.players.iter_mut().find(|p| *p.name() == *name)
    }

    /// Player-then-group lookup; absent when either link is missing.
    pub fn find_group(&self, player_name: &str, group_name: &str) -> Option<&CallGroup> {
        self.find_player(player_name)?.group(group_name)
    }

    pub fn find_group_mut(
        &mut self,
        player_name: &str,
        group_name: &str,
    ) -> Option<&mut CallGroup> {
        self.find_player_mut(player_name)?.group_mut(group_name)
    }

    /// Register a new player, seeded with the default groups.
    pub fn add_player(&mut self, name: PlayerName) -> Result<&mut PlayerEntry, RegistryError> {
        if self.find_player(name.as_str()).is_some() {
            return Err(RegistryError::PlayerExists(name.as_str().to_string()));
        }
        self.players.push(PlayerEntry::with_default_groups(name));
        // push succeeded, so last_mut is always present
        match self.players.last_mut() {
            Some(entry) => Ok(entry),
            None => Err(RegistryError::PlayerNotFound(String::new())),
        }
    }

    /// Add an empty group to an existing player.
    pub fn add_group(
        &mut self,
        player_name: &str,
        group_name: GroupName,
    ) -> Result<(), RegistryError> {
        let entry = self
            .find_player_mut(player_name)
            .ok_or_else(|| RegistryError::PlayerNotFound(player_name.to_string()))?;
        entry.add_group(group_name)
    }

    /// Remove a group. Silent no-op (false) when player or group is absent.
    pub fn remove_group(&mut self, player_name: &str, group_name: &str) -> bool {
        match self.find_player_mut(player_name) {
            Some(entry) => entry.remove_group(group_name),
            None => false,
        }
    }
}
