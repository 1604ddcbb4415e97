//! Builders for service-synthesized envelopes. Each one is timestamped now.

use chrono::Utc;

use feedback_core::types::TicketStatus;

use super::envelope::Envelope;
use super::types::{
    ChatMessageData, Participant, Payload, ReadReceiptData, StatusChangeData, TicketDeletedData,
    TicketSnapshot,
};

/// Registration acknowledgement, addressed from the connection to itself.
pub fn build_connect(own: Participant) -> Envelope {
    Envelope::new(Payload::Connect)
        .with_sender(own)
        .at(Utc::now())
}

/// New-ticket notice from the creator to the target.
pub fn build_new_ticket(ticket: &TicketSnapshot) -> Envelope {
    let creator = Participant::new(
        ticket.creator_id,
        ticket.creator_role,
        ticket.creator_name.clone(),
    );
    let target = Participant::new(
        ticket.target_id,
        ticket.target_type.principal_role(),
        ticket.target_name.clone(),
    );
    Envelope::new(Payload::NewTicket(Box::new(ticket.clone())))
        .with_sender(creator)
        .with_receiver(target)
        .at(Utc::now())
}

/// A new message on a ticket thread.
pub fn build_chat_message(sender: Participant, message: ChatMessageData) -> Envelope {
    Envelope::new(Payload::ChatMessage(message))
        .with_sender(sender)
        .at(Utc::now())
}

/// Ticket status transition. `actor` is `None` for automatic transitions.
pub fn build_status_change(
    ticket_id: u64,
    old_status: TicketStatus,
    new_status: TicketStatus,
    actor: Option<Participant>,
) -> Envelope {
    let envelope = Envelope::new(Payload::StatusChange(StatusChangeData {
        ticket_id,
        old_status,
        new_status,
    }))
    .at(Utc::now());
    match actor {
        Some(actor) => envelope.with_sender(actor),
        None => envelope,
    }
}

/// Ticket deletion notice.
pub fn build_ticket_deleted(ticket_id: u64, actor: Participant) -> Envelope {
    Envelope::new(Payload::TicketDeleted(TicketDeletedData { ticket_id }))
        .with_sender(actor)
        .at(Utc::now())
}

/// Read receipt for a message or a whole ticket.
pub fn build_read_receipt(receipt: ReadReceiptData, reader: Option<Participant>) -> Envelope {
    let envelope = Envelope::new(Payload::ReadReceipt(receipt)).at(Utc::now());
    match reader {
        Some(reader) => envelope.with_sender(reader),
        None => envelope,
    }
}
