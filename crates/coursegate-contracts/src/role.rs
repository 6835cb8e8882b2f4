//! Role labels and the fixed rank hierarchy.
//!
//! Roles form a total order `student < user < instructor < moderator <
//! admin < superadmin` (ranks 1 through 6).  Any label outside that table is
//! kept verbatim as `Role::Unrecognized` and ranks 0.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A role label attached to an actor or listed by a guarded resource.
///
/// Serialized as its plain lowercase label, so persisted session records
/// and audit payloads stay readable.  The derived ordering follows rank,
/// with unrecognized labels sorted last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Student,
    User,
    Instructor,
    Moderator,
    Admin,
    Superadmin,
    /// A label that is not part of the hierarchy.
    Unrecognized(String),
}

impl Role {
    /// The six recognized roles, lowest rank first.
    pub const RECOGNIZED: [Role; 6] = [
        Role::Student,
        Role::User,
        Role::Instructor,
        Role::Moderator,
        Role::Admin,
        Role::Superadmin,
    ];

    /// Parse a label.  Matching is exact; `"Admin"` is unrecognized.
    pub fn parse(label: &str) -> Self {
        match label {
            "student" => Role::Student,
            "user" => Role::User,
            "instructor" => Role::Instructor,
            "moderator" => Role::Moderator,
            "admin" => Role::Admin,
            "superadmin" => Role::Superadmin,
            other => Role::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "student",
            Role::User => "user",
            Role::Instructor => "instructor",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
            Role::Unrecognized(label) => label,
        }
    }

    /// Position in the hierarchy (1..=6).  Unrecognized roles rank 0.
    pub const fn rank(&self) -> u8 {
        match self {
            Role::Student => 1,
            Role::User => 2,
            Role::Instructor => 3,
            Role::Moderator => 4,
            Role::Admin => 5,
            Role::Superadmin => 6,
            Role::Unrecognized(_) => 0,
        }
    }

    /// The rank an actor needs to satisfy this role as a requirement.
    ///
    /// `None` for unrecognized roles: no rank can reach them, only an exact
    /// label match can.
    pub const fn required_rank(&self) -> Option<u8> {
        match self {
            Role::Unrecognized(_) => None,
            known => Some(known.rank()),
        }
    }

    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Role::Unrecognized(_))
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Role::parse(&label)
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Role::parse(label)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
