//! Individual WebSocket connection handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use feedback_core::types::IdentityKey;

use crate::message::types::Participant;

/// Unique connection identifier, used for log correlation and registry membership.
pub type ConnectionId = Uuid;

/// One encoded text frame. Shared between every buffer it is queued on.
pub type OutboundFrame = Arc<str>;

/// Result of a non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The frame is in the outbound buffer.
    Queued,
    /// The buffer is at capacity; the peer is dead or too slow.
    Full,
    /// The connection has already been closed.
    Closed,
}

#[derive(Debug)]
struct ConnectionState {
    closing: bool,
    outbound: Option<mpsc::Sender<OutboundFrame>>,
}

/// A handle to a single live WebSocket connection.
///
/// Owns the producer side of the bounded outbound buffer and the transport
/// shutdown signal. The write pump owns the consumer side; the read pump
/// watches the shutdown signal.
#[derive(Debug)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Identity this connection speaks for
    pub identity: IdentityKey,
    /// Display name (cached for sender stamping)
    pub display_name: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    state: Mutex<ConnectionState>,
    shutdown: watch::Sender<bool>,
}

impl Connection {
    /// Create a connection handle with an outbound buffer of `capacity` frames.
    ///
    /// Returns the handle and the receiver the write pump drains.
    pub fn new(
        identity: IdentityKey,
        display_name: impl Into<String>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        let handle = Arc::new(Self {
            id: Uuid::new_v4(),
            identity,
            display_name: display_name.into(),
            connected_at: Utc::now(),
            state: Mutex::new(ConnectionState {
                closing: false,
                outbound: Some(tx),
            }),
            shutdown,
        });
        (handle, rx)
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a frame without waiting.
    pub fn try_send(&self, frame: OutboundFrame) -> SendOutcome {
        let state = self.state();
        let Some(outbound) = state.outbound.as_ref() else {
            return SendOutcome::Closed;
        };
        match outbound.try_send(frame) {
            Ok(()) => SendOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => SendOutcome::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Tear the connection down.
    ///
    /// Sets the closing flag, signals the transport to shut, and closes the
    /// outbound buffer. Only the first call does anything; it returns `true`.
    pub fn close(&self) -> bool {
        let mut state = self.state();
        if state.closing {
            return false;
        }
        state.closing = true;
        state.outbound = None;
        self.shutdown.send_replace(true);
        true
    }

    /// Whether [`Connection::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.state().closing
    }

    /// Receiver that flips to `true` once the connection is closed.
    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// How long the connection has been up.
    pub fn uptime(&self) -> TimeDelta {
        Utc::now().signed_duration_since(self.connected_at)
    }

    /// This connection as a sender/receiver descriptor.
    pub fn participant(&self) -> Participant {
        Participant::new(
            self.identity.id,
            self.identity.role,
            self.display_name.clone(),
        )
    }
}
