//! Top-level realtime engine that ties the hub, router and notifier together.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use tokio::task::JoinHandle;
use tokio::sync::Mutex;
use tracing::{info, warn};

use feedback_core::config::RealtimeConfig;
use feedback_core::types::IdentityKey;

use crate::connection::pump::{PumpSettings, serve_socket};
use crate::hub::Hub;
use crate::metrics::RealtimeMetrics;
use crate::notification::directory::OperatorDirectory;
use crate::notification::dispatcher::Notifier;
use crate::router::EventRouter;

/// Central realtime engine. Created once at startup, shut down once at exit.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Identity-keyed connection hub.
    pub hub: Arc<Hub>,
    /// Inbound event router.
    pub router: Arc<EventRouter>,
    /// Service-side notifier.
    pub notifier: Arc<Notifier>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    settings: PumpSettings,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("settings", &self.settings)
            .finish()
    }
}

impl RealtimeEngine {
    /// Builds every subsystem and spawns the hub worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &RealtimeConfig, operators: Arc<dyn OperatorDirectory>) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let (hub, worker) = Hub::new(metrics.clone(), config.hub_queue_size);
        let hub = Arc::new(hub);
        let router = Arc::new(EventRouter::new(
            hub.clone(),
            metrics.clone(),
            config.max_frame_bytes,
        ));
        let notifier = Arc::new(Notifier::new(hub.clone(), operators));
        let worker = tokio::spawn(worker.run());
        let settings = PumpSettings::from(config);

        info!(
            buffer_size = settings.buffer_size,
            ping_interval = ?settings.ping_interval,
            pong_wait = ?settings.pong_wait,
            "Realtime engine initialized"
        );

        Self {
            hub,
            router,
            notifier,
            metrics,
            settings,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Serve an upgraded socket for `identity` until it disconnects.
    pub async fn serve(&self, socket: WebSocket, identity: IdentityKey, display_name: String) {
        serve_socket(
            socket,
            identity,
            display_name,
            self.hub.clone(),
            self.router.clone(),
            self.settings,
        )
        .await;
    }

    /// Close every connection and wait for the hub worker to stop.
    pub async fn shutdown(&self) {
        info!("Shutting down realtime engine");

        self.hub.shutdown().await;
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "Hub worker ended abnormally");
            }
        }

        info!("Realtime engine shut down");
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use feedback_core::types::PrincipalRole;

    use super::*;
    use crate::connection::handle::{Connection, OutboundFrame};
    use crate::notification::directory::StaticOperators;

    #[tokio::test]
    async fn test_shutdown_closes_live_connections() {
        let engine = RealtimeEngine::start(
            &RealtimeConfig::default(),
            Arc::new(StaticOperators::default()),
        );
        let (conn, _rx): (Arc<Connection>, mpsc::Receiver<OutboundFrame>) =
            Connection::new(IdentityKey::new(3, PrincipalRole::Individual), "bob", 4);
        engine.hub.register(conn.clone()).await;
        engine.hub.flush().await;
        assert_eq!(engine.hub.connection_count(), 1);

        engine.shutdown().await;
        engine.shutdown().await;

        assert!(conn.is_closed());
        assert_eq!(engine.hub.connection_count(), 0);
        assert_eq!(engine.metrics.snapshot().connections_closed, 1);
    }
}
