//! The envelope: the only frame format exchanged over the socket.
//!
//! ```json
//! { "event": "chat_message",
//!   "timestamp": "2024-05-01T12:00:00Z",
//!   "sender":   { "id": 5, "role": 2, "name": "Acme" },
//!   "receiver": { "id": 7, "role": 1, "name": "" },
//!   "data":     { ... kind-specific ... } }
//! ```

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use super::codec::CodecError;
use super::types::{EventKind, Participant, Payload, ReadReceiptData};

/// A decoded frame: event kind plus its typed payload and routing metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct Envelope {
    /// When the event happened. Stamped by the router when absent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Originator. Stamped from the connection when absent.
    pub sender: Option<Participant>,
    /// Declared recipient, if any.
    pub receiver: Option<Participant>,
    /// Kind-specific body.
    pub payload: Payload,
}

impl Envelope {
    /// Envelope with only a payload; timestamp and participants unset.
    pub fn new(payload: Payload) -> Self {
        Self {
            timestamp: None,
            sender: None,
            receiver: None,
            payload,
        }
    }

    /// Event kind of the payload.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Set the sender.
    pub fn with_sender(mut self, sender: Participant) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the receiver.
    pub fn with_receiver(mut self, receiver: Participant) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Set the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("Envelope", 5)?;
        out.serialize_field("event", &self.kind())?;

        match &self.timestamp {
            Some(ts) => out.serialize_field("timestamp", ts)?,
            None => out.skip_field("timestamp")?,
        }
        match &self.sender {
            Some(sender) => out.serialize_field("sender", sender)?,
            None => out.skip_field("sender")?,
        }
        match &self.receiver {
            Some(receiver) => out.serialize_field("receiver", receiver)?,
            None => out.skip_field("receiver")?,
        }

        match &self.payload {
            Payload::Connect | Payload::Disconnect => out.skip_field("data")?,
            Payload::ChatMessage(data) => out.serialize_field("data", data)?,
            Payload::Typing(data) => out.serialize_field("data", data)?,
            Payload::ReadReceipt(data) => out.serialize_field("data", data)?,
            Payload::StatusChange(data) => out.serialize_field("data", data)?,
            Payload::TicketDeleted(data) => out.serialize_field("data", data)?,
            Payload::NewTicket(data) => out.serialize_field("data", data)?,
        }

        out.end()
    }
}

/// Untyped wire shape, validated into an [`Envelope`].
#[derive(Debug, Deserialize)]
pub(crate) struct RawEnvelope {
    pub event: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender: Option<Participant>,
    #[serde(default)]
    pub receiver: Option<Participant>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = CodecError;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        let kind: EventKind = raw.event.parse().map_err(CodecError::UnknownEvent)?;

        let payload = match kind {
            EventKind::Connect => Payload::Connect,
            EventKind::Disconnect => Payload::Disconnect,
            EventKind::ChatMessage => Payload::ChatMessage(data_as(kind, raw.data)?),
            EventKind::Typing => Payload::Typing(data_as(kind, raw.data)?),
            EventKind::ReadReceipt => {
                let receipt: ReadReceiptData = data_as(kind, raw.data)?;
                if !receipt.is_well_formed() {
                    return Err(CodecError::AmbiguousReadReceipt);
                }
                Payload::ReadReceipt(receipt)
            }
            EventKind::StatusChange => Payload::StatusChange(data_as(kind, raw.data)?),
            EventKind::TicketDeleted => Payload::TicketDeleted(data_as(kind, raw.data)?),
            EventKind::NewTicket => Payload::NewTicket(Box::new(data_as(kind, raw.data)?)),
        };

        Ok(Self {
            timestamp: raw.timestamp,
            sender: raw.sender,
            receiver: raw.receiver,
            payload,
        })
    }
}

/// Decode the `data` object for a kind that requires one.
fn data_as<T: DeserializeOwned>(
    kind: EventKind,
    data: Option<serde_json::Value>,
) -> Result<T, CodecError> {
    match data {
        None | Some(serde_json::Value::Null) => Err(CodecError::MissingPayload(kind)),
        Some(data) => {
            serde_json::from_value(data).map_err(|source| CodecError::InvalidPayload { kind, source })
        }
    }
}
