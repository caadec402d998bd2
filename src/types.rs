/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a stored or submitted string is not part of a closed enumeration
#[derive(Debug, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// User roles. The set is closed; new users start as `Student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Student,
    Faculty,
    #[serde(rename = "HOD")]
    Hod,
    Principal,
    #[serde(rename = "ISTE")]
    Iste,
    #[serde(rename = "IEEE")]
    Ieee,
    #[serde(rename = "ETTC")]
    Ettc,
    Admin,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Student,
        Role::Faculty,
        Role::Hod,
        Role::Principal,
        Role::Iste,
        Role::Ieee,
        Role::Ettc,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
            Role::Hod => "HOD",
            Role::Principal => "Principal",
            Role::Iste => "ISTE",
            Role::Ieee => "IEEE",
            Role::Ettc => "ETTC",
            Role::Admin => "Admin",
        }
    }

    /// Everyone except students may create, edit and delete events
    pub fn can_manage_events(&self) -> bool {
        !matches!(self, Role::Student)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roles an admin may assign. Demoting to `Student` is not offered.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "role",
                value: s.to_string(),
            })
    }
}

/// Event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technical,
    Cultural,
    Sports,
    Workshop,
    Seminar,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Technical,
        Category::Cultural,
        Category::Sports,
        Category::Workshop,
        Category::Seminar,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "Technical",
            Category::Cultural => "Cultural",
            Category::Sports => "Sports",
            Category::Workshop => "Workshop",
            Category::Seminar => "Seminar",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "category",
                value: s.to_string(),
            })
    }
}
