//! Call group mutations: group lifecycle and member classification.
//!
//! All operations take the registry write lock for the full
//! mutate-then-persist sequence. A failed persist is logged and the in-memory
//! mutation is kept; the next successful mutation writes the full snapshot
//! again.

use std::sync::Arc;

use tokio::sync::RwLock;

use beacon_domain::{
    CallGroupRegistry, DomainError, FactionRef, GroupMember, GroupName, MemberKind, PlayerName,
    RegistryError, DEFAULT_GROUPS,
};

use crate::infrastructure::ports::{FactionPort, GroupStorePort, RosterPort};

/// Discriminated outcome of an add-member call.
///
/// The chat surface reports little more than success or failure; keeping the
/// cases apart here lets it name the actual reason and lets tests assert on
/// cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    AddedPerson(PlayerName),
    AddedFaction(FactionRef),
    /// Idempotent re-add; reported as success, nothing persisted.
    AlreadyPresent(GroupMember),
}

/// Outcome of a removal. The command surface stays silent either way
/// (fire-and-forget semantics); callers needing confirmation inspect this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    Absent,
    /// Refused by the builtin-group protection policy.
    Protected,
}

/// Display data for one group, produced for the list command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    pub name: String,
    pub factions: Vec<String>,
    pub persons: Vec<String>,
}

/// Errors from group operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("No such player: {0}")]
    PlayerNotFound(String),

    #[error("No such group: {0}")]
    GroupNotFound(String),

    #[error("Group already exists: {0}")]
    GroupExists(String),

    #[error("No player or faction matches: {0}")]
    NoSuchEntity(String),

    #[error("Faction is entirely NPC-controlled: {0}")]
    NpcFactionRejected(String),

    #[error("Not a real player: {0}")]
    BotPlayerRejected(String),

    #[error(transparent)]
    InvalidName(#[from] DomainError),

    #[error("Registry error: {0}")]
    Registry(String),
}

/// Group lifecycle and membership use cases.
pub struct GroupOps {
    registry: Arc<RwLock<CallGroupRegistry>>,
    store: Arc<dyn GroupStorePort>,
    roster: Arc<dyn RosterPort>,
    factions: Arc<dyn FactionPort>,
}

impl GroupOps {
    pub fn new(
        registry: Arc<RwLock<CallGroupRegistry>>,
        store: Arc<dyn GroupStorePort>,
        roster: Arc<dyn RosterPort>,
        factions: Arc<dyn FactionPort>,
    ) -> Self {
        Self {
            registry,
            store,
            roster,
            factions,
        }
    }

    /// Create a group for a player, optionally auto-creating the player
    /// record (seeded with the default groups) on first use.
    pub async fn add_group(
        &self,
        player_name: &str,
        group_name: &str,
        create_player: bool,
    ) -> Result<(), GroupError> {
        let group = GroupName::new(group_name)?;

        let mut registry = self.registry.write().await;
        let mut mutated = false;

        if registry.find_player(player_name).is_none() {
            if !create_player {
                return Err(GroupError::PlayerNotFound(player_name.to_string()));
            }
            let name = PlayerName::new(player_name)?;
            registry
                .add_player(name)
                .map_err(|e| GroupError::Registry(e.to_string()))?;
            mutated = true;
            tracing::info!(player = %player_name, "Registered player with default call groups");
        }

        let outcome = match registry.add_group(player_name, group) {
            Ok(()) => {
                mutated = true;
                tracing::info!(player = %player_name, group = %group_name, "Call group added");
                Ok(())
            }
            Err(RegistryError::GroupExists(g)) => Err(GroupError::GroupExists(g)),
            Err(RegistryError::PlayerNotFound(p)) => Err(GroupError::PlayerNotFound(p)),
            Err(e) => Err(GroupError::Registry(e.to_string())),
        };

        if mutated {
            self.persist(&registry).await;
        }
        outcome
    }

    /// Remove a group. Absent player or group is a silent no-op.
    pub async fn remove_group(
        &self,
        player_name: &str,
        group_name: &str,
        protect_builtins: bool,
    ) -> RemovalOutcome {
        if protect_builtins && DEFAULT_GROUPS.contains(&group_name) {
            tracing::debug!(group = %group_name, "Refusing to remove builtin group");
            return RemovalOutcome::Protected;
        }

        let mut registry = self.registry.write().await;
        if registry.remove_group(player_name, group_name) {
            tracing::info!(player = %player_name, group = %group_name, "Call group removed");
            self.persist(&registry).await;
            RemovalOutcome::Removed
        } else {
            RemovalOutcome::Absent
        }
    }

    /// Classify an entity name against the live world and insert it into a
    /// group.
    ///
    /// A name matching any known player (online or offline) is a person
    /// reference; bots are rejected. Otherwise the live faction list is
    /// searched for an exact name or tag match; NPC-only factions are
    /// rejected and the match is stored canonically as `"TAG - Name"`.
    /// The person check runs first, so a name that is both a player and a
    /// faction tag always classifies as a person.
    pub async fn add_member(
        &self,
        player_name: &str,
        group_name: &str,
        entity: &str,
    ) -> Result<AddOutcome, GroupError> {
        let mut registry = self.registry.write().await;

        if registry.find_player(player_name).is_none() {
            return Err(GroupError::PlayerNotFound(player_name.to_string()));
        }
        if registry.find_group(player_name, group_name).is_none() {
            return Err(GroupError::GroupNotFound(group_name.to_string()));
        }

        let member = self.classify(entity).await?;

        let group = registry
            .find_group_mut(player_name, group_name)
            .ok_or_else(|| GroupError::GroupNotFound(group_name.to_string()))?;

        let added = match &member {
            GroupMember::Person(name) => group.add_person(name.clone()),
            GroupMember::Faction(fref) => group.add_faction(fref.clone()),
        };

        if !added {
            // Already in the list; report success without touching storage.
            return Ok(AddOutcome::AlreadyPresent(member));
        }

        tracing::info!(
            player = %player_name,
            group = %group_name,
            member = %member,
            "Group member added"
        );
        self.persist(&registry).await;

        Ok(match member {
            GroupMember::Person(name) => AddOutcome::AddedPerson(name),
            GroupMember::Faction(fref) => AddOutcome::AddedFaction(fref),
        })
    }

    /// Remove a member from the named side of a group. Absent links and
    /// missing entries are silent no-ops.
    pub async fn remove_member(
        &self,
        player_name: &str,
        group_name: &str,
        kind: MemberKind,
        member_name: &str,
    ) -> RemovalOutcome {
        let mut registry = self.registry.write().await;
        let Some(group) = registry.find_group_mut(player_name, group_name) else {
            return RemovalOutcome::Absent;
        };

        if group.remove_member(kind, member_name) {
            tracing::info!(
                player = %player_name,
                group = %group_name,
                member = %member_name,
                "Group member removed"
            );
            self.persist(&registry).await;
            RemovalOutcome::Removed
        } else {
            RemovalOutcome::Absent
        }
    }

    /// Display data for a player's groups, or a single named group.
    pub async fn list(
        &self,
        player_name: &str,
        group_name: Option<&str>,
    ) -> Result<Vec<GroupListing>, GroupError> {
        let registry = self.registry.read().await;
        let entry = registry
            .find_player(player_name)
            .ok_or_else(|| GroupError::PlayerNotFound(player_name.to_string()))?;

        let groups: Vec<_> = match group_name {
            Some(name) => vec![entry
                .group(name)
                .ok_or_else(|| GroupError::GroupNotFound(name.to_string()))?],
            None => entry.groups().iter().collect(),
        };

        Ok(groups
            .into_iter()
            .map(|g| GroupListing {
                name: g.name().as_str().to_string(),
                factions: g.factions().iter().map(|f| f.canonical()).collect(),
                persons: g.persons().iter().map(|p| p.as_str().to_string()).collect(),
            })
            .collect())
    }

    async fn classify(&self, entity: &str) -> Result<GroupMember, GroupError> {
        if let Some(player) = self.roster.player_by_name(entity).await {
            if !player.is_real {
                return Err(GroupError::BotPlayerRejected(entity.to_string()));
            }
            return Ok(GroupMember::Person(PlayerName::new(player.display_name)?));
        }

        let faction = self
            .factions
            .all_factions()
            .await
            .into_iter()
            .find(|f| f.name == entity || f.tag == entity);

        match faction {
            None => Err(GroupError::NoSuchEntity(entity.to_string())),
            Some(f) if f.npc_only => Err(GroupError::NpcFactionRejected(f.tag)),
            Some(f) => Ok(GroupMember::Faction(FactionRef::new(f.tag, f.name)?)),
        }
    }

    async fn persist(&self, registry: &CallGroupRegistry) {
        if let Err(e) = self.store.save(registry).await {
            // In-memory state is kept; the change is lost only if the process
            // dies before the next successful save.
            tracing::error!(error = %e, "Failed to persist call group registry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        FactionInfo, MockFactionPort, MockGroupStorePort, MockRosterPort, RosterPlayer, StoreError,
    };
    use beacon_domain::PlayerId;

    fn real_player(id: u64, name: &str) -> RosterPlayer {
        RosterPlayer {
            id: PlayerId::new(id),
            display_name: name.to_string(),
            is_real: true,
        }
    }

    fn bot_player(id: u64, name: &str) -> RosterPlayer {
        RosterPlayer {
            id: PlayerId::new(id),
            display_name: name.to_string(),
            is_real: false,
        }
    }

    fn faction(tag: &str, name: &str, npc_only: bool) -> FactionInfo {
        FactionInfo {
            tag: tag.to_string(),
            name: name.to_string(),
            npc_only,
        }
    }

    fn seeded_registry(player: &str) -> Arc<RwLock<CallGroupRegistry>> {
        let mut registry = CallGroupRegistry::new();
        registry.add_player(PlayerName::new(player).unwrap()).unwrap();
        Arc::new(RwLock::new(registry))
    }

    fn saving_store() -> MockGroupStorePort {
        let mut store = MockGroupStorePort::new();
        store.expect_save().returning(|_| Ok(()));
        store
    }

    fn ops(
        registry: Arc<RwLock<CallGroupRegistry>>,
        store: MockGroupStorePort,
        roster: MockRosterPort,
        factions: MockFactionPort,
    ) -> GroupOps {
        GroupOps::new(registry, Arc::new(store), Arc::new(roster), Arc::new(factions))
    }

    #[tokio::test]
    async fn add_group_auto_creates_player_with_defaults() {
        let registry = Arc::new(RwLock::new(CallGroupRegistry::new()));
        let ops = ops(
            registry.clone(),
            saving_store(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        ops.add_group("Alice", "Rescue", true).await.unwrap();

        let reg = registry.read().await;
        let entry = reg.find_player("Alice").unwrap();
        let names: Vec<&str> = entry.groups().iter().map(|g| g.name().as_str()).collect();
        assert_eq!(names, vec!["Friendly", "Neutral", "Rescue"]);
    }

    #[tokio::test]
    async fn add_group_without_create_flag_requires_player() {
        let registry = Arc::new(RwLock::new(CallGroupRegistry::new()));
        let store = MockGroupStorePort::new(); // no save expected
        let ops = ops(registry, store, MockRosterPort::new(), MockFactionPort::new());

        let result = ops.add_group("Alice", "Rescue", false).await;
        assert!(matches!(result, Err(GroupError::PlayerNotFound(_))));
    }

    #[tokio::test]
    async fn add_group_twice_reports_conflict() {
        let registry = seeded_registry("Alice");
        let ops = ops(
            registry,
            saving_store(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        assert!(ops.add_group("Alice", "Rescue", false).await.is_ok());
        let result = ops.add_group("Alice", "Rescue", false).await;
        assert!(matches!(result, Err(GroupError::GroupExists(_))));
    }

    #[tokio::test]
    async fn implicit_player_creation_survives_group_conflict() {
        // addgroup Friendly with auto-create: the player record is created
        // (and persisted), then the seeded group collides.
        let registry = Arc::new(RwLock::new(CallGroupRegistry::new()));
        let ops = ops(
            registry.clone(),
            saving_store(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        let result = ops.add_group("Alice", "Friendly", true).await;
        assert!(matches!(result, Err(GroupError::GroupExists(_))));
        assert!(registry.read().await.find_player("Alice").is_some());
    }

    #[tokio::test]
    async fn person_wins_classification_tie_break() {
        // "SPRT" names both a real player and a faction tag; the player wins.
        let registry = seeded_registry("Alice");
        let mut roster = MockRosterPort::new();
        roster
            .expect_player_by_name()
            .returning(|name| Some(real_player(7, name)));
        let mut factions = MockFactionPort::new();
        factions.expect_all_factions().never();

        let ops = ops(registry.clone(), saving_store(), roster, factions);
        let outcome = ops.add_member("Alice", "Friendly", "SPRT").await.unwrap();

        assert!(matches!(outcome, AddOutcome::AddedPerson(_)));
        let reg = registry.read().await;
        let group = reg.find_group("Alice", "Friendly").unwrap();
        assert_eq!(group.persons().len(), 1);
        assert!(group.factions().is_empty());
    }

    #[tokio::test]
    async fn bot_players_are_rejected() {
        let registry = seeded_registry("Alice");
        let mut roster = MockRosterPort::new();
        roster
            .expect_player_by_name()
            .returning(|name| Some(bot_player(8, name)));

        let ops = ops(
            registry.clone(),
            MockGroupStorePort::new(),
            roster,
            MockFactionPort::new(),
        );
        let result = ops.add_member("Alice", "Friendly", "ServiceDrone").await;

        assert!(matches!(result, Err(GroupError::BotPlayerRejected(_))));
        let reg = registry.read().await;
        assert!(reg.find_group("Alice", "Friendly").unwrap().is_empty());
    }

    #[tokio::test]
    async fn faction_matches_by_name_or_tag_and_stores_canonically() {
        let registry = seeded_registry("Alice");
        let mut roster = MockRosterPort::new();
        roster.expect_player_by_name().returning(|_| None);
        let mut factions = MockFactionPort::new();
        factions
            .expect_all_factions()
            .returning(|| vec![faction("MILE", "Miners League", false)]);

        let ops = ops(registry.clone(), saving_store(), roster, factions);

        let outcome = ops
            .add_member("Alice", "Friendly", "Miners League")
            .await
            .unwrap();
        match outcome {
            AddOutcome::AddedFaction(fref) => {
                assert_eq!(fref.canonical(), "MILE - Miners League")
            }
            other => panic!("expected faction, got {:?}", other),
        }

        // Re-adding by tag is idempotent success.
        let outcome = ops.add_member("Alice", "Friendly", "MILE").await.unwrap();
        assert!(matches!(outcome, AddOutcome::AlreadyPresent(_)));

        let reg = registry.read().await;
        assert_eq!(reg.find_group("Alice", "Friendly").unwrap().factions().len(), 1);
    }

    #[tokio::test]
    async fn npc_only_factions_are_rejected() {
        let registry = seeded_registry("Alice");
        let mut roster = MockRosterPort::new();
        roster.expect_player_by_name().returning(|_| None);
        let mut factions = MockFactionPort::new();
        factions
            .expect_all_factions()
            .returning(|| vec![faction("SPRT", "Space Pirates", true)]);

        let ops = ops(
            registry.clone(),
            MockGroupStorePort::new(),
            roster,
            factions,
        );
        let result = ops.add_member("Alice", "Friendly", "SPRT - Space Pirates").await;

        // The canonical display string matches neither name nor tag, so this
        // is NoSuchEntity; the bare tag is the NPC rejection.
        assert!(matches!(result, Err(GroupError::NoSuchEntity(_))));

        let result = ops.add_member("Alice", "Friendly", "SPRT").await;
        assert!(matches!(result, Err(GroupError::NpcFactionRejected(_))));

        let reg = registry.read().await;
        assert!(reg.find_group("Alice", "Friendly").unwrap().factions().is_empty());
    }

    #[tokio::test]
    async fn unknown_entity_is_rejected_with_no_match() {
        let registry = seeded_registry("Alice");
        let mut roster = MockRosterPort::new();
        roster.expect_player_by_name().returning(|_| None);
        let mut factions = MockFactionPort::new();
        factions.expect_all_factions().returning(Vec::new);

        let ops = ops(registry, MockGroupStorePort::new(), roster, factions);
        let result = ops.add_member("Alice", "Friendly", "Ghost").await;
        assert!(matches!(result, Err(GroupError::NoSuchEntity(_))));
    }

    #[tokio::test]
    async fn add_member_requires_existing_group() {
        let registry = seeded_registry("Alice");
        let ops = ops(
            registry,
            MockGroupStorePort::new(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        let result = ops.add_member("Alice", "Rescue", "Bob").await;
        assert!(matches!(result, Err(GroupError::GroupNotFound(_))));

        let registry = Arc::new(RwLock::new(CallGroupRegistry::new()));
        let ops = ops_with_defaults(registry);
        let result = ops.add_member("Nobody", "Friendly", "Bob").await;
        assert!(matches!(result, Err(GroupError::PlayerNotFound(_))));
    }

    fn ops_with_defaults(registry: Arc<RwLock<CallGroupRegistry>>) -> GroupOps {
        GroupOps::new(
            registry,
            Arc::new(MockGroupStorePort::new()),
            Arc::new(MockRosterPort::new()),
            Arc::new(MockFactionPort::new()),
        )
    }

    #[tokio::test]
    async fn remove_member_targets_only_the_named_side() {
        let registry = seeded_registry("Alice");
        {
            let mut reg = registry.write().await;
            let group = reg.find_group_mut("Alice", "Friendly").unwrap();
            group.add_faction(FactionRef::new("SPRT", "Space Pirates").unwrap());
            group.add_person(PlayerName::new("SPRT").unwrap());
        }

        let ops = ops(
            registry.clone(),
            saving_store(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        let outcome = ops
            .remove_member("Alice", "Friendly", MemberKind::Faction, "SPRT - Space Pirates")
            .await;
        assert_eq!(outcome, RemovalOutcome::Removed);

        let reg = registry.read().await;
        let group = reg.find_group("Alice", "Friendly").unwrap();
        assert!(group.factions().is_empty());
        assert_eq!(group.persons().len(), 1, "person side must be untouched");
    }

    #[tokio::test]
    async fn remove_member_is_silent_when_absent() {
        let registry = seeded_registry("Alice");
        let ops = ops(
            registry,
            MockGroupStorePort::new(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        let outcome = ops
            .remove_member("Alice", "Friendly", MemberKind::Person, "Bob")
            .await;
        assert_eq!(outcome, RemovalOutcome::Absent);

        let outcome = ops
            .remove_member("Nobody", "Friendly", MemberKind::Person, "Bob")
            .await;
        assert_eq!(outcome, RemovalOutcome::Absent);
    }

    #[tokio::test]
    async fn remove_group_honors_builtin_protection_policy() {
        let registry = seeded_registry("Alice");
        let ops = ops(
            registry.clone(),
            saving_store(),
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        assert_eq!(
            ops.remove_group("Alice", "Friendly", true).await,
            RemovalOutcome::Protected
        );
        assert!(registry.read().await.find_group("Alice", "Friendly").is_some());

        // Default policy: builtins are removable like any other group.
        assert_eq!(
            ops.remove_group("Alice", "Friendly", false).await,
            RemovalOutcome::Removed
        );
        assert!(registry.read().await.find_group("Alice", "Friendly").is_none());
    }

    #[tokio::test]
    async fn persist_failure_keeps_in_memory_mutation_and_reports_success() {
        let registry = Arc::new(RwLock::new(CallGroupRegistry::new()));
        let mut store = MockGroupStorePort::new();
        store
            .expect_save()
            .returning(|_| Err(StoreError::Io("disk full".to_string())));

        let ops = ops(
            registry.clone(),
            store,
            MockRosterPort::new(),
            MockFactionPort::new(),
        );

        ops.add_group("Alice", "Rescue", true).await.unwrap();
        assert!(registry.read().await.find_group("Alice", "Rescue").is_some());
    }

    #[tokio::test]
    async fn list_reports_groups_in_order_with_canonical_members() {
        let registry = seeded_registry("Alice");
        {
            let mut reg = registry.write().await;
            let group = reg.find_group_mut("Alice", "Friendly").unwrap();
            group.add_faction(FactionRef::new("MILE", "Miners League").unwrap());
            group.add_person(PlayerName::new("Bob").unwrap());
        }

        let ops = ops_with_defaults(registry);

        let listings = ops.list("Alice", None).await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Friendly");
        assert_eq!(listings[0].factions, vec!["MILE - Miners League"]);
        assert_eq!(listings[0].persons, vec!["Bob"]);
        assert_eq!(listings[1].name, "Neutral");

        let single = ops.list("Alice", Some("Neutral")).await.unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].name, "Neutral");

        let missing = ops.list("Alice", Some("Rescue")).await;
        assert!(matches!(missing, Err(GroupError::GroupNotFound(_))));

        let nobody = ops.list("Nobody", None).await;
        assert!(matches!(nobody, Err(GroupError::PlayerNotFound(_))));
    }
}
