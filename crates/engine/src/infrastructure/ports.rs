//! Port traits for host and infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - Live roster queries (answered by the host session)
//! - Live faction roster queries (answered by the host session)
//! - Chat delivery and map marker delivery (host services)
//! - Registry storage (could swap the JSON snapshot for a database)
//! - Clock (for testing)
//!
//! The host implements the query/delivery ports; the engine ships the storage
//! and clock implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use beacon_domain::{CallGroupRegistry, PlayerId, Position, Rgb};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Recipient unreachable: {0}")]
    Unreachable(String),
    #[error("Delivery failed: {0}")]
    Failed(String),
}

// =============================================================================
// Infrastructure Types
// =============================================================================

/// A player as the live roster reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPlayer {
    /// Stable platform identity, the delivery address for notifications.
    pub id: PlayerId,
    /// Current display name, the key call groups store.
    pub display_name: String,
    /// False for bot/NPC-controlled identities, which may never join a group.
    pub is_real: bool,
}

/// A faction as the live faction roster reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionInfo {
    pub tag: String,
    pub name: String,
    /// True when every member is NPC-controlled.
    pub npc_only: bool,
}

/// Payload for the map marker attached to each notified recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct DistressMarker {
    pub label: String,
    pub description: String,
    pub position: Position,
    pub color: Rgb,
}

// =============================================================================
// Host Query Ports
// =============================================================================

/// Live player roster queries.
///
/// `player_by_name` searches all identities the session knows about, online
/// or offline; `online_players` returns only currently-connected ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterPort: Send + Sync {
    async fn player_by_name(&self, name: &str) -> Option<RosterPlayer>;
    async fn online_players(&self) -> Vec<RosterPlayer>;
}

/// Live faction roster queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FactionPort: Send + Sync {
    async fn all_factions(&self) -> Vec<FactionInfo>;
    async fn faction_by_tag(&self, tag: &str) -> Option<FactionInfo>;
    async fn is_member(&self, tag: &str, player: PlayerId) -> bool;
}

// =============================================================================
// Host Delivery Ports
// =============================================================================

/// Chat delivery, attributed to a named sender.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn send_as(
        &self,
        sender: &str,
        recipient: PlayerId,
        text: &str,
        color: Rgb,
    ) -> Result<(), DeliveryError>;
}

/// Map marker delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarkerPort: Send + Sync {
    async fn add_marker(
        &self,
        recipient: PlayerId,
        marker: &DistressMarker,
    ) -> Result<(), DeliveryError>;
}

// =============================================================================
// Storage Port
// =============================================================================

/// Durable registry storage.
///
/// `load` returns `Ok(None)` when no snapshot exists yet; `save` replaces the
/// whole snapshot. Both operate on the full registry - the dataset is one
/// small document per server instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupStorePort: Send + Sync {
    async fn load(&self) -> Result<Option<CallGroupRegistry>, StoreError>;
    async fn save(&self, registry: &CallGroupRegistry) -> Result<(), StoreError>;
}

// =============================================================================
// Clock Port
// =============================================================================

/// Wall-clock access, injected so snapshot timestamps are testable.
#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
