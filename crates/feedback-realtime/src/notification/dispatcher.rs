//! Notifier: fans out events synthesized by the ticket and message services.
//!
//! These envelopes never pass through inbound decode. Unicast deliveries go
//! straight through [`Hub::send_to_identity`]; ticket-wide state changes are
//! broadcast.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error};

use feedback_core::types::{IdentityKey, PrincipalId, PrincipalRole, TargetType, TicketStatus};

use crate::connection::handle::OutboundFrame;
use crate::hub::Hub;
use crate::message::builder::{
    build_chat_message, build_new_ticket, build_read_receipt, build_status_change,
    build_ticket_deleted,
};
use crate::message::codec::encode;
use crate::message::envelope::Envelope;
use crate::message::types::{ChatMessageData, Participant, ReadReceiptData, TicketSnapshot};

use super::directory::OperatorDirectory;

/// The two parties a ticket thread is between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketParties {
    /// Who opened the ticket.
    pub creator: IdentityKey,
    /// Principal the ticket is addressed to.
    pub target_id: PrincipalId,
    /// Kind of principal the ticket is addressed to.
    pub target_type: TargetType,
}

impl TicketParties {
    /// Identity the target connects under.
    pub fn target(&self) -> IdentityKey {
        IdentityKey::new(self.target_id, self.target_type.principal_role())
    }
}

impl From<&TicketSnapshot> for TicketParties {
    fn from(ticket: &TicketSnapshot) -> Self {
        Self {
            creator: ticket.creator(),
            target_id: ticket.target_id,
            target_type: ticket.target_type,
        }
    }
}

/// Outcome of a unicast fan-out. Each identity appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Identities the frame was queued for.
    pub delivered: Vec<IdentityKey>,
    /// Identities that were offline or evicted.
    pub offline: Vec<IdentityKey>,
}

/// Fan-out state for one notification: the frame plus everyone already covered.
struct Fanout<'a> {
    hub: &'a Hub,
    frame: OutboundFrame,
    covered: HashSet<IdentityKey>,
    report: DeliveryReport,
}

impl<'a> Fanout<'a> {
    fn new(hub: &'a Hub, frame: OutboundFrame) -> Self {
        Self {
            hub,
            frame,
            covered: HashSet::new(),
            report: DeliveryReport::default(),
        }
    }

    /// Send to `identity` unless it has already been sent to.
    fn send(&mut self, identity: IdentityKey) {
        if !self.covered.insert(identity) {
            return;
        }
        if self.hub.send_to_identity(&identity, self.frame.clone()) {
            self.report.delivered.push(identity);
        } else {
            self.report.offline.push(identity);
        }
    }

    fn finish(self) -> DeliveryReport {
        self.report
    }
}

/// Pushes ticket and message activity to connected principals.
#[derive(Debug)]
pub struct Notifier {
    hub: Arc<Hub>,
    operators: Arc<dyn OperatorDirectory>,
}

impl Notifier {
    /// Creates a notifier that mirrors to the operators listed in `operators`.
    pub fn new(hub: Arc<Hub>, operators: Arc<dyn OperatorDirectory>) -> Self {
        Self { hub, operators }
    }

    /// A ticket was created.
    ///
    /// Sent to the target, then mirrored to every operator unless the target
    /// is itself an operator.
    pub fn ticket_created(&self, ticket: &TicketSnapshot) -> DeliveryReport {
        let Some(frame) = frame_of(&build_new_ticket(ticket)) else {
            return DeliveryReport::default();
        };
        let parties = TicketParties::from(ticket);

        let mut fanout = Fanout::new(&self.hub, frame);
        fanout.send(parties.target());
        if parties.target_type != TargetType::Operator {
            self.mirror_to_operators(&mut fanout);
        }

        let report = fanout.finish();
        debug!(
            ticket_id = ticket.ticket_id,
            delivered = report.delivered.len(),
            offline = report.offline.len(),
            "New ticket notification sent"
        );
        report
    }

    /// A message was posted on a ticket thread.
    ///
    /// Sent to the creator and the target when they are not the sender,
    /// echoed back to the sender, then mirrored to operators unless the
    /// target is an operator. No identity receives it twice.
    pub fn message_posted(
        &self,
        parties: TicketParties,
        sender: Participant,
        message: ChatMessageData,
    ) -> DeliveryReport {
        let ticket_id = message.ticket_id;
        let sender_key = sender.identity();
        let Some(frame) = frame_of(&build_chat_message(sender, message)) else {
            return DeliveryReport::default();
        };

        let mut fanout = Fanout::new(&self.hub, frame);
        // The sender is covered last, but must not be reached as creator or target first.
        fanout.covered.insert(sender_key);
        fanout.send(parties.creator);
        fanout.send(parties.target());
        fanout.covered.remove(&sender_key);
        fanout.send(sender_key);
        if parties.target_type != TargetType::Operator {
            self.mirror_to_operators(&mut fanout);
        }

        let report = fanout.finish();
        debug!(
            ticket_id,
            delivered = report.delivered.len(),
            offline = report.offline.len(),
            "New message notification sent"
        );
        report
    }

    /// A ticket changed status. Broadcast.
    pub async fn status_changed(
        &self,
        ticket_id: u64,
        old_status: TicketStatus,
        new_status: TicketStatus,
        actor: Option<Participant>,
    ) {
        self.broadcast(&build_status_change(ticket_id, old_status, new_status, actor))
            .await;
    }

    /// A ticket was deleted. Broadcast.
    pub async fn ticket_deleted(&self, ticket_id: u64, actor: Participant) {
        self.broadcast(&build_ticket_deleted(ticket_id, actor)).await;
    }

    /// One message was read. Broadcast.
    pub async fn message_read(&self, message_id: u64, reader: Option<Participant>) {
        self.broadcast(&build_read_receipt(
            ReadReceiptData::for_message(message_id),
            reader,
        ))
        .await;
    }

    /// Every message on a ticket was read. Broadcast.
    pub async fn ticket_read(&self, ticket_id: u64, reader: Option<Participant>) {
        self.broadcast(&build_read_receipt(
            ReadReceiptData::for_ticket(ticket_id),
            reader,
        ))
        .await;
    }

    fn mirror_to_operators(&self, fanout: &mut Fanout<'_>) {
        for id in self.operators.operator_ids() {
            fanout.send(IdentityKey::new(id, PrincipalRole::Operator));
        }
    }

    async fn broadcast(&self, envelope: &Envelope) {
        if let Some(frame) = frame_of(envelope) {
            debug!(event = %envelope.kind(), "Broadcasting notification");
            self.hub.broadcast(frame).await;
        }
    }
}

fn frame_of(envelope: &Envelope) -> Option<OutboundFrame> {
    match encode(envelope) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!(event = %envelope.kind(), error = %e, "Failed to encode notification");
            None
        }
    }
}
