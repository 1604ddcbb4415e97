//! Registry: the authoritative identity → live connection mapping.
//!
//! Two views are kept over the same set of live connections: every
//! connection (for broadcast) and one entry per identity key (for unicast).
//! Both are mutated only while holding the single registry lock. The
//! identity view is a back-reference: a key resolves to a connection, but
//! only the path that calls [`Connection::close`] ends its life.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use feedback_core::types::IdentityKey;

use crate::connection::handle::{Connection, ConnectionId, OutboundFrame, SendOutcome};
use crate::message::builder::build_connect;
use crate::message::codec::encode;
use crate::metrics::RealtimeMetrics;

#[derive(Debug, Default)]
struct RegistryState {
    /// Every live connection.
    connections: HashMap<ConnectionId, Arc<Connection>>,
    /// Identity key → the connection currently speaking for it.
    by_identity: HashMap<IdentityKey, Arc<Connection>>,
}

impl RegistryState {
    fn contains(&self, conn: &Arc<Connection>) -> bool {
        self.connections
            .get(&conn.id)
            .is_some_and(|existing| Arc::ptr_eq(existing, conn))
    }

    /// Drop `conn` from both views. The identity entry is only removed if it
    /// still points at this exact connection.
    fn detach(&mut self, conn: &Arc<Connection>) {
        self.connections.remove(&conn.id);
        if self
            .by_identity
            .get(&conn.identity)
            .is_some_and(|current| Arc::ptr_eq(current, conn))
        {
            self.by_identity.remove(&conn.identity);
        }
    }
}

/// Result of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the frame was queued on.
    pub delivered: usize,
    /// Connections evicted because their buffer was full or closed.
    pub evicted: usize,
}

/// Lock-guarded registry of live connections.
#[derive(Debug)]
pub struct Registry {
    state: Mutex<RegistryState>,
    metrics: Arc<RealtimeMetrics>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(metrics: Arc<RealtimeMetrics>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs `conn` as the live connection for its identity.
    ///
    /// Any incumbent for the same identity is closed and removed first, then
    /// a `connect` envelope is queued on the new connection.
    pub fn register(&self, conn: Arc<Connection>) {
        let mut state = self.lock();

        state.connections.insert(conn.id, conn.clone());

        if let Some(incumbent) = state.by_identity.get(&conn.identity).cloned() {
            if !Arc::ptr_eq(&incumbent, &conn) {
                incumbent.close();
                state.detach(&incumbent);
                self.metrics.connection_evicted();
                self.metrics.connection_closed();
                info!(
                    conn_id = %incumbent.id,
                    replaced_by = %conn.id,
                    identity = %conn.identity,
                    "Superseded connection evicted"
                );
            }
        }

        state.by_identity.insert(conn.identity, conn.clone());
        self.metrics.connection_opened();

        match encode(&build_connect(conn.participant())) {
            Ok(frame) => {
                if conn.try_send(frame) != SendOutcome::Queued {
                    warn!(conn_id = %conn.id, "Could not queue connect acknowledgement");
                }
            }
            Err(e) => error!(error = %e, "Failed to encode connect event"),
        }

        info!(
            conn_id = %conn.id,
            principal_id = %conn.identity.id,
            role = %conn.identity.role,
            "WebSocket connection registered"
        );
    }

    /// Removes `conn` and closes it. Returns `false` if it was no longer registered.
    pub fn unregister(&self, conn: &Arc<Connection>) -> bool {
        let mut state = self.lock();

        if !state.contains(conn) {
            debug!(conn_id = %conn.id, "Unregister for connection no longer in registry");
            return false;
        }

        state.detach(conn);
        conn.close();
        self.metrics.connection_closed();

        info!(
            conn_id = %conn.id,
            principal_id = %conn.identity.id,
            role = %conn.identity.role,
            "WebSocket connection unregistered"
        );
        true
    }

    /// Queues `frame` on every live connection, evicting any whose buffer is full.
    pub fn broadcast(&self, frame: &OutboundFrame) -> BroadcastReport {
        let mut state = self.lock();
        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();

        for conn in state.connections.values() {
            match conn.try_send(frame.clone()) {
                SendOutcome::Queued => {
                    report.delivered += 1;
                    self.metrics.message_delivered();
                }
                SendOutcome::Full | SendOutcome::Closed => {
                    self.metrics.message_dropped();
                    dead.push(conn.clone());
                }
            }
        }

        for conn in &dead {
            conn.close();
            state.detach(conn);
            self.metrics.connection_evicted();
            self.metrics.connection_closed();
            warn!(conn_id = %conn.id, identity = %conn.identity, "Evicted unresponsive connection during broadcast");
        }
        report.evicted = dead.len();

        report
    }

    /// Queues `frame` on the connection for `identity`, if one is live.
    ///
    /// Returns `true` only when the frame was queued. A full buffer evicts
    /// the connection; an absent identity changes nothing.
    pub fn send_to_identity(&self, identity: &IdentityKey, frame: OutboundFrame) -> bool {
        let mut state = self.lock();

        let Some(conn) = state.by_identity.get(identity).cloned() else {
            debug!(identity = %identity, "Recipient offline");
            return false;
        };

        match conn.try_send(frame) {
            SendOutcome::Queued => {
                self.metrics.message_delivered();
                true
            }
            SendOutcome::Full | SendOutcome::Closed => {
                self.metrics.message_dropped();
                conn.close();
                state.detach(&conn);
                self.metrics.connection_evicted();
                self.metrics.connection_closed();
                warn!(conn_id = %conn.id, identity = %identity, "Evicted unresponsive connection on unicast");
                false
            }
        }
    }

    /// Closes and removes every connection.
    pub fn close_all(&self) -> usize {
        let mut state = self.lock();
        let count = state.connections.len();
        for conn in state.connections.values() {
            conn.close();
            self.metrics.connection_closed();
        }
        state.connections.clear();
        state.by_identity.clear();
        info!(count, "All connections closed");
        count
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Number of identities with a live connection.
    pub fn identity_count(&self) -> usize {
        self.lock().by_identity.len()
    }

    /// Whether `identity` currently has a live connection.
    pub fn is_online(&self, identity: &IdentityKey) -> bool {
        self.lock().by_identity.contains_key(identity)
    }

    /// Connection ID currently installed for `identity`.
    pub fn connection_for(&self, identity: &IdentityKey) -> Option<ConnectionId> {
        self.lock().by_identity.get(identity).map(|conn| conn.id)
    }
}
