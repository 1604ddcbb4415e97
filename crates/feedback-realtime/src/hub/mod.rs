//! The hub: identity-keyed registry plus its command queue.
//!
//! Register, unregister and broadcast are queued and applied by a single
//! [`HubWorker`] task. The queue is bounded: when the worker falls behind,
//! producers wait for space. Unicast goes straight to the registry under its
//! lock and reports whether the frame was queued.

pub mod registry;
pub mod worker;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use feedback_core::types::IdentityKey;

use crate::connection::handle::{Connection, OutboundFrame};
use crate::metrics::RealtimeMetrics;

pub use registry::{BroadcastReport, Registry};
pub use worker::{HubCommand, HubWorker};

/// Front end of the realtime hub. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Hub {
    registry: Arc<Registry>,
    commands: mpsc::Sender<HubCommand>,
}

impl Hub {
    /// Creates a hub with room for `queue_capacity` pending commands, and the
    /// worker that must be spawned to drive it.
    pub fn new(metrics: Arc<RealtimeMetrics>, queue_capacity: usize) -> (Self, HubWorker) {
        let registry = Arc::new(Registry::new(metrics));
        let (commands, rx) = mpsc::channel(queue_capacity.max(1));
        let worker = HubWorker::new(registry.clone(), rx);
        (Self { registry, commands }, worker)
    }

    /// Queues a registration. If the hub has stopped, the connection is closed instead.
    pub async fn register(&self, conn: Arc<Connection>) {
        if let Err(mpsc::error::SendError(HubCommand::Register(conn))) =
            self.commands.send(HubCommand::Register(conn)).await
        {
            warn!(conn_id = %conn.id, "Hub stopped, rejecting connection");
            conn.close();
        }
    }

    /// Queues removal of `conn`. Safe to call more than once.
    pub async fn unregister(&self, conn: Arc<Connection>) {
        if let Err(mpsc::error::SendError(HubCommand::Unregister(conn))) =
            self.commands.send(HubCommand::Unregister(conn)).await
        {
            conn.close();
        }
    }

    /// Queues `frame` for every live connection, waiting while the queue is full.
    pub async fn broadcast(&self, frame: OutboundFrame) {
        if self.commands.send(HubCommand::Broadcast(frame)).await.is_err() {
            debug!("Hub stopped, broadcast dropped");
        }
    }

    /// Delivers `frame` to the connection for `identity`.
    ///
    /// Returns `false` if the identity is offline or its buffer was full.
    pub fn send_to_identity(&self, identity: &IdentityKey, frame: OutboundFrame) -> bool {
        self.registry.send_to_identity(identity, frame)
    }

    /// Waits until every command queued before this call has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(HubCommand::Flush(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Asks the worker to close every connection and stop.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(HubCommand::Shutdown).await;
    }

    /// Whether `identity` has a live connection.
    pub fn is_online(&self, identity: &IdentityKey) -> bool {
        self.registry.is_online(identity)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Number of identities with a live connection.
    pub fn identity_count(&self) -> usize {
        self.registry.identity_count()
    }
}
