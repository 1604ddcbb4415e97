//! Inbound event routing.
//!
//! Decodes frames read from a connection, fills in the sender and timestamp
//! when the client left them out, and hands the envelope to the hub as a
//! unicast or a broadcast depending on its kind.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use feedback_core::types::IdentityKey;

use crate::connection::handle::Connection;
use crate::hub::Hub;
use crate::message::codec::{decode, encode};
use crate::message::envelope::Envelope;
use crate::message::types::EventKind;
use crate::metrics::RealtimeMetrics;

/// What the router did with an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Sent to the declared receiver only.
    Unicast {
        /// Receiver identity.
        to: IdentityKey,
        /// Whether the frame was queued on a live connection.
        delivered: bool,
    },
    /// Queued for every live connection.
    Broadcast,
    /// Not redispatched (`connect`, `disconnect`) or not encodable.
    Dropped,
}

/// Event router shared by every connection's read pump.
#[derive(Debug)]
pub struct EventRouter {
    hub: Arc<Hub>,
    metrics: Arc<RealtimeMetrics>,
    max_frame_bytes: usize,
}

impl EventRouter {
    /// Creates a router that dispatches through `hub`.
    pub fn new(hub: Arc<Hub>, metrics: Arc<RealtimeMetrics>, max_frame_bytes: usize) -> Self {
        Self {
            hub,
            metrics,
            max_frame_bytes,
        }
    }

    /// Hub counters this router reports into.
    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }

    /// Decode and dispatch one frame read from `conn`.
    ///
    /// A frame that fails to decode is logged and dropped; the connection stays open.
    pub async fn route_inbound(&self, conn: &Connection, raw: &str) -> Option<Route> {
        self.metrics.frame_received();

        let envelope = match decode(raw, self.max_frame_bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.metrics.frame_rejected();
                warn!(conn_id = %conn.id, error = %e, "Dropping undecodable frame");
                return None;
            }
        };

        Some(self.dispatch(stamp(conn, envelope)).await)
    }

    /// Send an envelope according to its kind.
    ///
    /// `chat_message`, `typing`, `read_receipt` and `new_ticket` go to the
    /// declared receiver, or to everyone if none is declared. `status_change`
    /// and `ticket_deleted` always go to everyone. A broadcast waits while the
    /// hub queue is full.
    pub async fn dispatch(&self, envelope: Envelope) -> Route {
        let kind = envelope.kind();
        let unicast_to = match kind {
            EventKind::Connect | EventKind::Disconnect => {
                debug!(event = %kind, "Informational event not redispatched");
                return Route::Dropped;
            }
            EventKind::ChatMessage
            | EventKind::Typing
            | EventKind::ReadReceipt
            | EventKind::NewTicket => envelope.receiver.as_ref().map(|r| r.identity()),
            EventKind::StatusChange | EventKind::TicketDeleted => None,
        };

        let frame = match encode(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                error!(event = %kind, error = %e, "Failed to encode envelope");
                return Route::Dropped;
            }
        };

        match unicast_to {
            Some(to) => {
                let delivered = self.hub.send_to_identity(&to, frame);
                debug!(event = %kind, receiver = %to, delivered, "Unicast dispatched");
                Route::Unicast { to, delivered }
            }
            None => {
                self.hub.broadcast(frame).await;
                debug!(event = %kind, "Broadcast dispatched");
                Route::Broadcast
            }
        }
    }
}

/// Fill in sender and timestamp from the connection when absent.
fn stamp(conn: &Connection, mut envelope: Envelope) -> Envelope {
    if envelope.sender.is_none() {
        envelope.sender = Some(conn.participant());
    }
    if envelope.timestamp.is_none() {
        envelope.timestamp = Some(Utc::now());
    }
    envelope
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use feedback_core::types::PrincipalRole;

    use super::*;
    use crate::connection::handle::OutboundFrame;

    struct Fixture {
        hub: Arc<Hub>,
        router: EventRouter,
    }

    impl Fixture {
        fn start() -> Self {
            let metrics = Arc::new(RealtimeMetrics::new());
            let (hub, worker) = Hub::new(metrics.clone(), 64);
            tokio::spawn(worker.run());
            let hub = Arc::new(hub);
            let router = EventRouter::new(hub.clone(), metrics, 512 * 1024);
            Self { hub, router }
        }

        async fn join(
            &self,
            id: u64,
            role: PrincipalRole,
            name: &str,
        ) -> (Arc<Connection>, mpsc::Receiver<OutboundFrame>) {
            let (conn, mut rx) = Connection::new(IdentityKey::new(id, role), name, 16);
            self.hub.register(conn.clone()).await;
            self.hub.flush().await;
            let _ = rx.try_recv(); // connect acknowledgement
            (conn, rx)
        }
    }

    fn received(rx: &mut mpsc::Receiver<OutboundFrame>) -> Option<Envelope> {
        rx.try_recv()
            .ok()
            .map(|frame| decode(&frame, usize::MAX).expect("decode"))
    }

    #[tokio::test]
    async fn test_chat_without_receiver_is_stamped_and_broadcast() {
        let fx = Fixture::start();
        let (acme, mut acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;
        let (_alice, mut alice_rx) = fx.join(7, PrincipalRole::Individual, "alice").await;

        let frame = r#"{"event":"chat_message","data":{"ticket_id":1,"message_id":2,"content_type":1,"content":"hi","created_at":"2024-05-01T12:00:00Z"}}"#;
        let route = fx.router.route_inbound(&acme, frame).await;
        fx.hub.flush().await;

        assert_eq!(route, Some(Route::Broadcast));
        for rx in [&mut acme_rx, &mut alice_rx] {
            let envelope = received(rx).expect("broadcast frame");
            let sender = envelope.sender.expect("sender");
            assert_eq!(sender.identity(), IdentityKey::new(5, PrincipalRole::Organization));
            assert_eq!(sender.name, "Acme");
            assert!(envelope.timestamp.is_some());
        }
    }

    #[tokio::test]
    async fn test_declared_receiver_gets_unicast() {
        let fx = Fixture::start();
        let (acme, mut acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;
        let (_alice, mut alice_rx) = fx.join(7, PrincipalRole::Individual, "alice").await;

        let frame = r#"{"event":"typing","receiver":{"id":7,"role":1},"data":{"ticket_id":1,"is_typing":true}}"#;
        let route = fx.router.route_inbound(&acme, frame).await;

        assert_eq!(
            route,
            Some(Route::Unicast {
                to: IdentityKey::new(7, PrincipalRole::Individual),
                delivered: true
            })
        );
        assert_eq!(received(&mut alice_rx).map(|e| e.kind()), Some(EventKind::Typing));
        fx.hub.flush().await;
        assert!(received(&mut acme_rx).is_none());
    }

    #[tokio::test]
    async fn test_offline_receiver_is_not_delivered() {
        let fx = Fixture::start();
        let (acme, _acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;

        let frame = r#"{"event":"read_receipt","receiver":{"id":9,"role":1},"data":{"message_id":3}}"#;
        let route = fx.router.route_inbound(&acme, frame).await;

        assert_eq!(
            route,
            Some(Route::Unicast {
                to: IdentityKey::new(9, PrincipalRole::Individual),
                delivered: false
            })
        );
        assert_eq!(fx.hub.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_status_change_ignores_receiver() {
        let fx = Fixture::start();
        let (acme, mut acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;
        let (_alice, mut alice_rx) = fx.join(7, PrincipalRole::Individual, "alice").await;

        let frame = r#"{"event":"status_change","receiver":{"id":7,"role":1},"data":{"ticket_id":1,"old_status":1,"new_status":3}}"#;
        assert_eq!(fx.router.route_inbound(&acme, frame).await, Some(Route::Broadcast));
        fx.hub.flush().await;

        assert!(received(&mut acme_rx).is_some());
        assert!(received(&mut alice_rx).is_some());
    }

    #[tokio::test]
    async fn test_connect_is_not_redispatched() {
        let fx = Fixture::start();
        let (acme, mut acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;

        assert_eq!(
            fx.router.route_inbound(&acme, r#"{"event":"connect"}"#).await,
            Some(Route::Dropped)
        );
        fx.hub.flush().await;
        assert!(received(&mut acme_rx).is_none());
    }

    #[tokio::test]
    async fn test_bad_frame_is_counted_and_connection_kept() {
        let fx = Fixture::start();
        let (acme, _acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;

        assert_eq!(fx.router.route_inbound(&acme, r#"{"event":"unknown"}"#).await, None);
        assert_eq!(fx.router.route_inbound(&acme, "{").await, None);

        let snapshot = fx.router.metrics().snapshot();
        assert_eq!(snapshot.frames_received, 2);
        assert_eq!(snapshot.frames_rejected, 2);
        assert!(!acme.is_closed());
        assert!(fx.hub.is_online(&acme.identity));
    }

    #[tokio::test]
    async fn test_client_supplied_sender_is_kept() {
        let fx = Fixture::start();
        let (acme, mut acme_rx) = fx.join(5, PrincipalRole::Organization, "Acme").await;

        let frame = r#"{"event":"ticket_deleted","sender":{"id":1,"role":3,"name":"root"},"timestamp":"2024-05-01T12:00:00Z","data":{"ticket_id":4}}"#;
        fx.router.route_inbound(&acme, frame).await;
        fx.hub.flush().await;

        let envelope = received(&mut acme_rx).expect("broadcast frame");
        assert_eq!(envelope.sender.map(|s| s.role), Some(PrincipalRole::Operator));
        assert_eq!(
            envelope.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-05-01T12:00:00+00:00".to_string())
        );
    }
}
