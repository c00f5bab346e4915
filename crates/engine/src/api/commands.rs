//! Chat command surface.
//!
//! The host parses `!distress ...` invocations and hands the typed command to
//! `handle` together with the invoking player's context. Responses are plain
//! lines the host relays back to that player. Delete, add-member, and call
//! stay silent on success; only failures talk back.

use beacon_domain::{MemberKind, Position};

use crate::app::App;
use crate::use_cases::{CallContext, GroupError, GroupListing, RemovalOutcome};

/// Fixed response when the feature toggle is off.
pub const DISABLED_MESSAGE: &str = "This command is currently disabled";

/// A parsed distress command.
#[derive(Debug, Clone, PartialEq)]
pub enum DistressCommand {
    /// `!distress addgroup <group>`
    AddGroup { group: String },
    /// `!distress deletegroup <group>`
    DeleteGroup { group: String },
    /// `!distress add <faction tag | player name> <group>`
    AddMember { entity: String, group: String },
    /// `!distress delete <faction|person> <name> <group>`
    RemoveMember {
        kind: MemberKind,
        name: String,
        group: String,
    },
    /// `!distress call <group>`
    Call { group: String },
    /// `!distress list [group]`
    List { group: Option<String> },
}

/// The invoking player, as reported by the host's command dispatcher.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub caller: String,
    pub position: Position,
}

/// Execute one command and produce the response lines for the caller.
///
/// The feature toggle gates everything except read-only listing.
pub async fn handle(app: &App, ctx: &CommandContext, command: DistressCommand) -> Vec<String> {
    let is_listing = matches!(command, DistressCommand::List { .. });
    if !is_listing && !app.is_enabled().await {
        return vec![DISABLED_MESSAGE.to_string()];
    }

    match command {
        DistressCommand::AddGroup { group } => {
            match app.groups.add_group(&ctx.caller, &group, true).await {
                Ok(()) => vec![format!(
                    "distress addgroup: '{}' added for player: {}",
                    group, ctx.caller
                )],
                Err(GroupError::GroupExists(_)) => vec![format!(
                    "distress addgroup: '{}' already exists for player: {}",
                    group, ctx.caller
                )],
                Err(e) => vec![format!("distress addgroup: failed. {}", e)],
            }
        }

        DistressCommand::DeleteGroup { group } => {
            let protect = app.protect_builtin_groups().await;
            match app.groups.remove_group(&ctx.caller, &group, protect).await {
                RemovalOutcome::Protected => vec![format!(
                    "distress deletegroup: '{}' is predefined and cannot be removed",
                    group
                )],
                // Removed and absent alike stay silent; callers needing
                // confirmation re-query with list.
                RemovalOutcome::Removed | RemovalOutcome::Absent => Vec::new(),
            }
        }

        DistressCommand::AddMember { entity, group } => {
            match app.groups.add_member(&ctx.caller, &group, &entity).await {
                Ok(_) => Vec::new(),
                Err(GroupError::NoSuchEntity(_)) => vec![format!(
                    "distress add: failed. No player or faction found with this name or tag: {}",
                    entity
                )],
                Err(GroupError::NpcFactionRejected(_)) => vec![format!(
                    "distress add: failed. Faction is NPC-controlled: {}",
                    entity
                )],
                Err(GroupError::BotPlayerRejected(_)) => vec![format!(
                    "distress add: failed. {} is not a real player",
                    entity
                )],
                Err(e) => vec![format!("distress add: failed. {}", e)],
            }
        }

        DistressCommand::RemoveMember { kind, name, group } => {
            app.groups
                .remove_member(&ctx.caller, &group, kind, &name)
                .await;
            Vec::new()
        }

        DistressCommand::Call { group } => {
            let call_ctx = CallContext {
                sender: ctx.caller.clone(),
                position: ctx.position,
            };
            match app.distress.call(&call_ctx, &group).await {
                None => vec!["distress call: no such player or group".to_string()],
                Some(_) => Vec::new(),
            }
        }

        DistressCommand::List { group } => {
            match app.groups.list(&ctx.caller, group.as_deref()).await {
                Ok(listings) => listings.iter().map(format_listing).collect(),
                Err(GroupError::PlayerNotFound(_)) => {
                    vec!["no player record found".to_string()]
                }
                Err(GroupError::GroupNotFound(g)) => vec![format!("no such group: {}", g)],
                Err(e) => vec![format!("distress list: failed. {}", e)],
            }
        }
    }
}

fn format_listing(listing: &GroupListing) -> String {
    format!(
        "{}: Factions: {}; Persons: {}",
        listing.name,
        listing.factions.join(", "),
        listing.persons.join(", ")
    )
}
