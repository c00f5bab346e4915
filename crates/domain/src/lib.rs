//! Beacon domain: the call group registry data model.
//!
//! Pure types and invariant-preserving operations; no I/O, no host bindings.
//! The engine crate owns locking, persistence, and resolution against the
//! live roster.

pub mod error;
pub mod ids;
pub mod registry;
pub mod value_objects;

pub use error::{DomainError, RegistryError};
pub use ids::PlayerId;
pub use registry::{CallGroup, CallGroupRegistry, PlayerEntry, DEFAULT_GROUPS};
pub use value_objects::{FactionRef, GroupMember, GroupName, MemberKind, PlayerName, Position, Rgb};
