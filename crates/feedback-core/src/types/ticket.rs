//! Ticket vocabulary: target types, statuses, and message content types.
//!
//! All three enums travel as small integer codes.

use serde::{Deserialize, Serialize};

use super::identity::PrincipalRole;
use crate::error::AppError;

/// Who a ticket is addressed to. A separate code space from [`PrincipalRole`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TargetType {
    /// Addressed to a merchant.
    Organization,
    /// Addressed to the platform administrators.
    Operator,
}

impl TargetType {
    /// Wire code of this target type.
    pub fn code(self) -> u8 {
        match self {
            Self::Organization => 1,
            Self::Operator => 2,
        }
    }

    /// Role under which the target principal connects.
    pub fn principal_role(self) -> PrincipalRole {
        match self {
            Self::Organization => PrincipalRole::Organization,
            Self::Operator => PrincipalRole::Operator,
        }
    }
}

impl TryFrom<u8> for TargetType {
    type Error = AppError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Organization),
            2 => Ok(Self::Operator),
            other => Err(AppError::validation(format!(
                "Invalid ticket target type: {other}. Expected 1 or 2"
            ))),
        }
    }
}

impl From<TargetType> for u8 {
    fn from(target: TargetType) -> u8 {
        target.code()
    }
}

/// Ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TicketStatus {
    /// Filed, nobody has answered yet.
    Open,
    /// The target has replied.
    InProgress,
    /// Closed; no further messages accepted.
    Resolved,
}

impl TicketStatus {
    /// Wire code of this status.
    pub fn code(self) -> u8 {
        match self {
            Self::Open => 1,
            Self::InProgress => 2,
            Self::Resolved => 3,
        }
    }
}

impl TryFrom<u8> for TicketStatus {
    type Error = AppError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Open),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::Resolved),
            other => Err(AppError::validation(format!(
                "Invalid ticket status: {other}. Expected 1, 2, or 3"
            ))),
        }
    }
}

impl From<TicketStatus> for u8 {
    fn from(status: TicketStatus) -> u8 {
        status.code()
    }
}

/// Kind of content carried by a ticket message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ContentType {
    /// Plain text.
    Text,
    /// A single image URL.
    Image,
    /// A JSON array of image URLs.
    Images,
}

impl ContentType {
    /// Wire code of this content type.
    pub fn code(self) -> u8 {
        match self {
            Self::Text => 1,
            Self::Image => 2,
            Self::Images => 3,
        }
    }
}

impl TryFrom<u8> for ContentType {
    type Error = AppError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Text),
            2 => Ok(Self::Image),
            3 => Ok(Self::Images),
            other => Err(AppError::validation(format!(
                "Invalid content type: {other}. Expected 1, 2, or 3"
            ))),
        }
    }
}

impl From<ContentType> for u8 {
    fn from(content: ContentType) -> u8 {
        content.code()
    }
}
