//! Event kinds, participant descriptors, and kind-specific payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use feedback_core::types::{
    ContentType, IdentityKey, PrincipalId, PrincipalRole, TargetType, TicketStatus,
};

/// Every event the hub understands. Anything else is rejected at decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Registration acknowledgement sent to a freshly registered connection.
    Connect,
    /// Informational disconnect notice.
    Disconnect,
    /// A new message on a ticket thread.
    ChatMessage,
    /// Typing indicator.
    Typing,
    /// A message or ticket was read.
    ReadReceipt,
    /// Ticket status transition.
    StatusChange,
    /// A ticket was deleted.
    TicketDeleted,
    /// A ticket was created.
    NewTicket,
}

impl EventKind {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ChatMessage => "chat_message",
            Self::Typing => "typing",
            Self::ReadReceipt => "read_receipt",
            Self::StatusChange => "status_change",
            Self::TicketDeleted => "ticket_deleted",
            Self::NewTicket => "new_ticket",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connect" => Ok(Self::Connect),
            "disconnect" => Ok(Self::Disconnect),
            "chat_message" => Ok(Self::ChatMessage),
            "typing" => Ok(Self::Typing),
            "read_receipt" => Ok(Self::ReadReceipt),
            "status_change" => Ok(Self::StatusChange),
            "ticket_deleted" => Ok(Self::TicketDeleted),
            "new_ticket" => Ok(Self::NewTicket),
            other => Err(other.to_string()),
        }
    }
}

/// Sender or receiver descriptor carried by an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Principal ID.
    pub id: PrincipalId,
    /// Principal role (wire code).
    pub role: PrincipalRole,
    /// Display name. May be empty for receivers.
    #[serde(default)]
    pub name: String,
}

impl Participant {
    /// Create a descriptor.
    pub fn new(id: impl Into<PrincipalId>, role: PrincipalRole, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            name: name.into(),
        }
    }

    /// Identity key this descriptor resolves to.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(self.id, self.role)
    }
}

/// Payload of a `chat_message` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageData {
    /// Ticket the message belongs to.
    pub ticket_id: u64,
    /// Message ID.
    pub message_id: u64,
    /// Content type.
    pub content_type: ContentType,
    /// Text, an image URL, or a JSON array of image URLs.
    pub content: String,
    /// When the message was stored.
    pub created_at: DateTime<Utc>,
}

/// Payload of a `typing` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingData {
    /// Ticket being typed in.
    pub ticket_id: u64,
    /// Whether the participant is currently typing.
    pub is_typing: bool,
}

/// Payload of a `read_receipt` event. Exactly one of the two IDs is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceiptData {
    /// A single message marked read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u64>,
    /// Every message on a ticket marked read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<u64>,
}

impl ReadReceiptData {
    /// Receipt for one message.
    pub fn for_message(message_id: u64) -> Self {
        Self {
            message_id: Some(message_id),
            ticket_id: None,
        }
    }

    /// Receipt for a whole ticket thread.
    pub fn for_ticket(ticket_id: u64) -> Self {
        Self {
            message_id: None,
            ticket_id: Some(ticket_id),
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.message_id.is_some() != self.ticket_id.is_some()
    }
}

/// Payload of a `status_change` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeData {
    /// Ticket whose status changed.
    pub ticket_id: u64,
    /// Previous status.
    pub old_status: TicketStatus,
    /// New status.
    pub new_status: TicketStatus,
}

/// Payload of a `ticket_deleted` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDeletedData {
    /// Deleted ticket.
    pub ticket_id: u64,
}

/// Full ticket snapshot carried by a `new_ticket` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    /// Ticket ID.
    pub ticket_id: u64,
    /// Title.
    pub title: String,
    /// Initial body text.
    pub content: String,
    /// Creator principal.
    pub creator_id: PrincipalId,
    /// Creator role.
    pub creator_role: PrincipalRole,
    /// Creator display name.
    #[serde(default)]
    pub creator_name: String,
    /// Target principal.
    pub target_id: PrincipalId,
    /// Target type (organization or operator).
    pub target_type: TargetType,
    /// Target display name.
    #[serde(default)]
    pub target_name: String,
    /// Current status.
    pub status: TicketStatus,
    /// Attached image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TicketSnapshot {
    /// Identity of the creator.
    pub fn creator(&self) -> IdentityKey {
        IdentityKey::new(self.creator_id, self.creator_role)
    }

    /// Identity of the target, with the target type translated into role space.
    pub fn target(&self) -> IdentityKey {
        IdentityKey::new(self.target_id, self.target_type.principal_role())
    }
}

/// Kind-specific body of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `connect`
    Connect,
    /// `disconnect`
    Disconnect,
    /// `chat_message`
    ChatMessage(ChatMessageData),
    /// `typing`
    Typing(TypingData),
    /// `read_receipt`
    ReadReceipt(ReadReceiptData),
    /// `status_change`
    StatusChange(StatusChangeData),
    /// `ticket_deleted`
    TicketDeleted(TicketDeletedData),
    /// `new_ticket`
    NewTicket(Box<TicketSnapshot>),
}

impl Payload {
    /// The event kind this payload belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect => EventKind::Connect,
            Self::Disconnect => EventKind::Disconnect,
            Self::ChatMessage(_) => EventKind::ChatMessage,
            Self::Typing(_) => EventKind::Typing,
            Self::ReadReceipt(_) => EventKind::ReadReceipt,
            Self::StatusChange(_) => EventKind::StatusChange,
            Self::TicketDeleted(_) => EventKind::TicketDeleted,
            Self::NewTicket(_) => EventKind::NewTicket,
        }
    }
}
