//! Faction references and group membership kinds.
//!
//! A `FactionRef` is a denormalized snapshot of a faction taken at the moment
//! it was added to a call group. It is stored and displayed in the canonical
//! `"TAG - Full Name"` form; only the tag is used as a key when membership is
//! resolved against the live faction roster.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::PlayerName;

/// Separator between tag and full name in the canonical form.
const CANONICAL_SEPARATOR: &str = " - ";

/// A faction snapshot stored in a call group.
///
/// Not re-validated against the live roster until resolution time, when it is
/// matched back to a live faction by tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FactionRef {
    tag: String,
    name: String,
}

impl FactionRef {
    /// Create a faction reference from a live faction's tag and full name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if either part is empty after
    /// trimming.
    pub fn new(tag: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let tag = tag.into();
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(DomainError::validation("Faction tag cannot be empty"));
        }
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Faction name cannot be empty"));
        }
        Ok(Self {
            tag: tag.to_string(),
            name: name.to_string(),
        })
    }

    /// The faction tag, the resolution key.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The faction's full name as it was when the reference was taken.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical `"TAG - Full Name"` storage/display form.
    pub fn canonical(&self) -> String {
        format!("{}{}{}", self.tag, CANONICAL_SEPARATOR, self.name)
    }

    /// Whether `needle` identifies this reference: either the canonical form
    /// or the bare tag. Removal commands accept both.
    pub fn matches(&self, needle: &str) -> bool {
        self.tag == needle || self.canonical() == needle
    }
}

impl fmt::Display for FactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tag, CANONICAL_SEPARATOR, self.name)
    }
}

impl FromStr for FactionRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, name) = s.split_once(CANONICAL_SEPARATOR).ok_or_else(|| {
            DomainError::parse(format!(
                "Faction reference must be in 'TAG - Name' form: {}",
                s
            ))
        })?;
        Self::new(tag, name)
    }
}

impl TryFrom<String> for FactionRef {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FactionRef> for String {
    fn from(fref: FactionRef) -> String {
        fref.canonical()
    }
}

/// Which side of a group's membership an entry lives on.
///
/// Removal callers state the kind explicitly instead of encoding it into the
/// display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Faction,
    Person,
}

/// A single member entry of a call group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupMember {
    Faction(FactionRef),
    Person(PlayerName),
}

impl GroupMember {
    pub fn kind(&self) -> MemberKind {
        match self {
            GroupMember::Faction(_) => MemberKind::Faction,
            GroupMember::Person(_) => MemberKind::Person,
        }
    }
}

impl fmt::Display for GroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMember::Faction(fref) => write!(f, "{}", fref),
            GroupMember::Person(name) => write!(f, "{}", name),
        }
    }
}
