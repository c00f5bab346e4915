pub mod faction_ref;
pub mod geometry;
pub mod names;

pub use faction_ref::{FactionRef, GroupMember, MemberKind};
pub use geometry::{Position, Rgb};
pub use names::{GroupName, PlayerName};
