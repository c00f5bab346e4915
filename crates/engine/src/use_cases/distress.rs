//! Distress calls: recipient resolution and notification dispatch.
//!
//! Resolution is the one place where stored configuration meets the live,
//! time-varying world: it is always re-derived at call time, never cached,
//! because faction rosters and online status change continuously.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use beacon_domain::{CallGroupRegistry, PlayerId, PlayerName, Position, Rgb};

use crate::infrastructure::ports::{
    ChatPort, DistressMarker, FactionPort, MarkerPort, RosterPort,
};

/// Marker color for distress call map markers.
const MARKER_COLOR: Rgb = Rgb(251, 51, 255);

/// Correlation ID tying together all deliveries of a single distress call in
/// the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short format (first 8 characters) for logging.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The invoking player's identity and position at the moment of the call.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub sender: String,
    pub position: Position,
}

/// Delivery counts for one dispatched call. Per-recipient failures are not
/// surfaced as errors; they only show up here and in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReport {
    pub call_id: CallId,
    pub delivered: usize,
    pub failed: usize,
}

/// Distress call use cases.
pub struct DistressOps {
    registry: Arc<RwLock<CallGroupRegistry>>,
    roster: Arc<dyn RosterPort>,
    factions: Arc<dyn FactionPort>,
    chat: Arc<dyn ChatPort>,
    markers: Arc<dyn MarkerPort>,
}

impl DistressOps {
    pub fn new(
        registry: Arc<RwLock<CallGroupRegistry>>,
        roster: Arc<dyn RosterPort>,
        factions: Arc<dyn FactionPort>,
        chat: Arc<dyn ChatPort>,
        markers: Arc<dyn MarkerPort>,
    ) -> Self {
        Self {
            registry,
            roster,
            factions,
            chat,
            markers,
        }
    }

    /// Resolve a group into the set of currently-online recipient identities.
    ///
    /// `None` when the player or group does not exist; an existing group with
    /// nobody reachable resolves to an empty set. An online player qualifies
    /// by exact display-name match against the person list, or by membership
    /// in any live faction whose tag matches a stored faction ref. Identities
    /// are deduplicated.
    pub async fn resolve_recipients(
        &self,
        player_name: &str,
        group_name: &str,
    ) -> Option<HashSet<PlayerId>> {
        let (faction_tags, persons) = {
            let registry = self.registry.read().await;
            let group = registry.find_group(player_name, group_name)?;
            let tags: Vec<String> = group
                .factions()
                .iter()
                .map(|f| f.tag().to_string())
                .collect();
            let persons: Vec<PlayerName> = group.persons().to_vec();
            (tags, persons)
        };

        let mut recipients = HashSet::new();
        for online in self.roster.online_players().await {
            if persons.iter().any(|p| p.as_str() == online.display_name) {
                recipients.insert(online.id);
                continue;
            }
            for tag in &faction_tags {
                // Stale refs whose faction no longer exists are skipped, not
                // pruned; the group keeps its snapshot.
                if self.factions.faction_by_tag(tag).await.is_none() {
                    continue;
                }
                if self.factions.is_member(tag, online.id).await {
                    recipients.insert(online.id);
                    break;
                }
            }
        }
        Some(recipients)
    }

    /// Deliver a distress notification to every resolved recipient.
    ///
    /// Delivery is best-effort and independent per recipient: one recipient
    /// dropping between resolution and delivery must not block the rest.
    pub async fn dispatch(
        &self,
        ctx: &CallContext,
        recipients: &HashSet<PlayerId>,
    ) -> CallReport {
        let call_id = CallId::new();
        let text = format!("DISTRESS CALL - {}", ctx.sender);
        let marker = DistressMarker {
            label: format!("{} Distress Call", ctx.sender),
            description: "Distress Call".to_string(),
            position: ctx.position,
            color: MARKER_COLOR,
        };

        let mut delivered = 0;
        let mut failed = 0;
        for &recipient in recipients {
            let mut ok = true;
            if let Err(e) = self
                .chat
                .send_as(&ctx.sender, recipient, &text, Rgb::YELLOW)
                .await
            {
                tracing::warn!(
                    call_id = %call_id.short(),
                    recipient = %recipient,
                    error = %e,
                    "Failed to deliver distress chat message"
                );
                ok = false;
            }
            if let Err(e) = self.markers.add_marker(recipient, &marker).await {
                tracing::warn!(
                    call_id = %call_id.short(),
                    recipient = %recipient,
                    error = %e,
                    "Failed to attach distress marker"
                );
                ok = false;
            }
            if ok {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        tracing::info!(
            call_id = %call_id.short(),
            sender = %ctx.sender,
            delivered,
            failed,
            "Distress call dispatched"
        );
        CallReport {
            call_id,
            delivered,
            failed,
        }
    }

    /// Resolve and dispatch in one step. `None` only when the player or group
    /// does not exist.
    pub async fn call(&self, ctx: &CallContext, group_name: &str) -> Option<CallReport> {
        let recipients = self.resolve_recipients(&ctx.sender, group_name).await?;
        Some(self.dispatch(ctx, &recipients).await)
    }
}
