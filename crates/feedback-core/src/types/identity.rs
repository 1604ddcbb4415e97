//! Principal identifiers, roles, and the composite identity key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Numeric identifier of an account (end user, merchant, or administrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub u64);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PrincipalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Kind of principal behind a connection.
///
/// Encoded on the wire as the numeric codes 1, 2, and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PrincipalRole {
    /// An end user filing tickets.
    Individual,
    /// A merchant receiving tickets.
    Organization,
    /// A platform administrator.
    Operator,
}

impl PrincipalRole {
    /// Wire code of this role.
    pub fn code(self) -> u8 {
        match self {
            Self::Individual => 1,
            Self::Organization => 2,
            Self::Operator => 3,
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: u8) -> Result<Self, AppError> {
        match code {
            1 => Ok(Self::Individual),
            2 => Ok(Self::Organization),
            3 => Ok(Self::Operator),
            other => Err(AppError::validation(format!(
                "Invalid principal role code: {other}. Expected 1, 2, or 3"
            ))),
        }
    }

    /// Return the role as a lowercase string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Organization => "organization",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for PrincipalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<u8> for PrincipalRole {
    type Error = AppError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<PrincipalRole> for u8 {
    fn from(role: PrincipalRole) -> u8 {
        role.code()
    }
}

/// Composite key under which at most one live connection may exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    /// Principal identifier.
    pub id: PrincipalId,
    /// Principal role.
    pub role: PrincipalRole,
}

impl IdentityKey {
    /// Build a key from its parts.
    pub fn new(id: impl Into<PrincipalId>, role: PrincipalRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.role.code())
    }
}
