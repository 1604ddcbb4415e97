//! Single consumer of the hub command queue.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::connection::handle::{Connection, OutboundFrame};

use super::registry::Registry;

/// A request for the hub worker.
#[derive(Debug)]
pub enum HubCommand {
    /// Install a connection, evicting any incumbent for the same identity.
    Register(Arc<Connection>),
    /// Remove a connection, if it is still the registered one.
    Unregister(Arc<Connection>),
    /// Deliver one frame to every live connection.
    Broadcast(OutboundFrame),
    /// Reply once every earlier command has been applied.
    Flush(oneshot::Sender<()>),
    /// Close every connection and stop the worker.
    Shutdown,
}

/// Applies [`HubCommand`]s to the registry in arrival order.
#[derive(Debug)]
pub struct HubWorker {
    registry: Arc<Registry>,
    commands: mpsc::Receiver<HubCommand>,
}

impl HubWorker {
    pub(crate) fn new(
        registry: Arc<Registry>,
        commands: mpsc::Receiver<HubCommand>,
    ) -> Self {
        Self { registry, commands }
    }

    /// Runs until a shutdown command arrives or every sender is dropped.
    pub async fn run(mut self) {
        info!("Hub worker started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register(conn) => self.registry.register(conn),
                HubCommand::Unregister(conn) => {
                    self.registry.unregister(&conn);
                }
                HubCommand::Broadcast(frame) => {
                    let report = self.registry.broadcast(&frame);
                    debug!(
                        delivered = report.delivered,
                        evicted = report.evicted,
                        "Broadcast complete"
                    );
                }
                HubCommand::Flush(done) => {
                    let _ = done.send(());
                }
                HubCommand::Shutdown => {
                    self.registry.close_all();
                    break;
                }
            }
        }

        info!("Hub worker stopped");
    }
}
