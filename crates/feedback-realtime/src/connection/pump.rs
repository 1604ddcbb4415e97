//! Read and write pumps: the two tasks that move frames between a socket and
//! the hub for one connection.
//!
//! The write pump is the only writer on the socket. It drains the outbound
//! buffer, coalescing whatever is already queued into one text frame, and
//! sends a heartbeat ping every `ping_interval`. The read pump is the only
//! reader. It holds a read deadline that each pong or inbound frame pushes
//! `pong_wait` into the future.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::{FutureExt, Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use feedback_core::config::RealtimeConfig;
use feedback_core::types::IdentityKey;

use super::handle::{Connection, OutboundFrame};
use crate::hub::Hub;
use crate::router::EventRouter;

/// Deadlines and limits the pumps run with.
#[derive(Debug, Clone, Copy)]
pub struct PumpSettings {
    /// Read deadline, renewed by pongs and inbound frames.
    pub pong_wait: Duration,
    /// Deadline for writing one frame.
    pub write_wait: Duration,
    /// Heartbeat period. Strictly shorter than `pong_wait`.
    pub ping_interval: Duration,
    /// Outbound buffer capacity.
    pub buffer_size: usize,
}

impl From<&RealtimeConfig> for PumpSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            pong_wait: config.pong_wait(),
            write_wait: config.write_wait(),
            ping_interval: config.ping_interval(),
            buffer_size: config.outbound_buffer_size,
        }
    }
}

/// Serve one upgraded socket until either side ends it.
///
/// Creates the connection, queues its registration, runs the write pump on
/// its own task and the read pump on the current one.
pub async fn serve_socket(
    socket: WebSocket,
    identity: IdentityKey,
    display_name: String,
    hub: Arc<Hub>,
    router: Arc<EventRouter>,
    settings: PumpSettings,
) {
    let (sink, stream) = socket.split();
    let (conn, outbound) = Connection::new(identity, display_name, settings.buffer_size);

    info!(
        conn_id = %conn.id,
        principal_id = %identity.id,
        role = %identity.role,
        "WebSocket connection established"
    );

    hub.register(conn.clone()).await;

    let writer = tokio::spawn(write_pump(conn.clone(), outbound, sink, settings));
    read_pump(conn.clone(), stream, hub, router, settings).await;

    if let Err(e) = writer.await {
        warn!(conn_id = %conn.id, error = %e, "Write pump task failed");
    }

    info!(
        conn_id = %conn.id,
        principal_id = %identity.id,
        role = %identity.role,
        uptime_secs = conn.uptime().num_seconds(),
        "WebSocket connection closed"
    );
}

/// Drain the outbound buffer onto the socket and keep the peer alive with pings.
///
/// Exits when the buffer is closed (after sending a close frame), on a failed
/// or timed-out write. Closes the connection on the way out.
pub async fn write_pump<S>(
    conn: Arc<Connection>,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    mut sink: S,
    settings: PumpSettings,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut heartbeat = time::interval_at(
        Instant::now() + settings.ping_interval,
        settings.ping_interval,
    );
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    let _ = time::timeout(settings.write_wait, sink.send(Message::Close(None))).await;
                    debug!(conn_id = %conn.id, "Outbound buffer closed, close frame sent");
                    break;
                };

                let mut batch = String::from(&*frame);
                for _ in 0..outbound.len() {
                    match outbound.try_recv() {
                        Ok(next) => {
                            batch.push('\n');
                            batch.push_str(&next);
                        }
                        Err(_) => break,
                    }
                }

                if !write(&conn, &mut sink, Message::Text(batch.into()), settings.write_wait).await {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if !write(&conn, &mut sink, Message::Ping(Bytes::new()), settings.write_wait).await {
                    break;
                }
            }
        }
    }

    conn.close();
}

async fn write<S>(conn: &Connection, sink: &mut S, message: Message, write_wait: Duration) -> bool
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match time::timeout(write_wait, sink.send(message)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(conn_id = %conn.id, error = %e, "WebSocket write failed");
            false
        }
        Err(_) => {
            warn!(conn_id = %conn.id, "WebSocket write timed out");
            false
        }
    }
}

/// Read frames until the peer goes away, the deadline passes, or the
/// connection is closed elsewhere. Unregisters the connection exactly once.
pub async fn read_pump<S, E>(
    conn: Arc<Connection>,
    mut stream: S,
    hub: Arc<Hub>,
    router: Arc<EventRouter>,
    settings: PumpSettings,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut closed = conn.closed_signal();
    let deadline = time::sleep(settings.pong_wait);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = closed.wait_for(|closed| *closed).map(|_| ()) => {
                debug!(conn_id = %conn.id, "Connection closed, read pump stopping");
                break;
            }
            _ = &mut deadline => {
                info!(conn_id = %conn.id, "Read deadline passed without a pong");
                break;
            }
            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        debug!(conn_id = %conn.id, error = %e, "WebSocket read error");
                        break;
                    }
                    None => break,
                };

                deadline.as_mut().reset(Instant::now() + settings.pong_wait);

                match message {
                    Message::Text(text) => {
                        router.route_inbound(&conn, text.as_str()).await;
                    }
                    Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                        Ok(text) => {
                            router.route_inbound(&conn, text).await;
                        }
                        Err(_) => debug!(conn_id = %conn.id, "Dropping non-UTF-8 binary frame"),
                    },
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
        }
    }

    hub.unregister(conn).await;
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::channel::mpsc as fmpsc;
    use futures::stream;

    use feedback_core::types::PrincipalRole;

    use super::*;
    use crate::metrics::RealtimeMetrics;

    fn settings() -> PumpSettings {
        PumpSettings {
            pong_wait: Duration::from_secs(10),
            write_wait: Duration::from_secs(1),
            ping_interval: Duration::from_secs(9),
            buffer_size: 8,
        }
    }

    fn identity() -> IdentityKey {
        IdentityKey::new(7, PrincipalRole::Individual)
    }

    fn start_hub() -> (Arc<Hub>, Arc<EventRouter>) {
        let metrics = Arc::new(RealtimeMetrics::new());
        let (hub, worker) = Hub::new(metrics.clone(), 64);
        tokio::spawn(worker.run());
        let hub = Arc::new(hub);
        let router = Arc::new(EventRouter::new(hub.clone(), metrics, 512 * 1024));
        (hub, router)
    }

    #[tokio::test]
    async fn test_write_pump_batches_queued_frames() {
        let (conn, rx) = Connection::new(identity(), "alice", 8);
        let (sink, mut written) = fmpsc::unbounded::<Message>();
        conn.try_send(Arc::from("a"));
        conn.try_send(Arc::from("b"));
        conn.try_send(Arc::from("c"));
        conn.close();

        write_pump(conn.clone(), rx, sink, settings()).await;

        // Closing drops the sender but frames already queued are still delivered.
        match written.next().await {
            Some(Message::Text(text)) => assert_eq!(text.as_str(), "a\nb\nc"),
            other => panic!("expected text frame, got {other:?}"),
        }
        assert!(matches!(written.next().await, Some(Message::Close(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_pump_sends_heartbeat() {
        let (conn, rx) = Connection::new(identity(), "alice", 8);
        let (sink, mut written) = fmpsc::unbounded::<Message>();
        let task = tokio::spawn(write_pump(conn.clone(), rx, sink, settings()));

        time::advance(Duration::from_secs(10)).await;
        assert!(matches!(written.next().await, Some(Message::Ping(_))));

        conn.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_write_pump_closes_connection_on_write_failure() {
        let (conn, rx) = Connection::new(identity(), "alice", 8);
        let (sink, written) = fmpsc::unbounded::<Message>();
        drop(written);
        conn.try_send(Arc::from("lost"));

        write_pump(conn.clone(), rx, sink, settings()).await;
        assert!(conn.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_pump_deadline_unregisters() {
        let (hub, router) = start_hub();
        let (conn, _rx) = Connection::new(identity(), "alice", 8);
        hub.register(conn.clone()).await;
        hub.flush().await;

        let silent = stream::pending::<Result<Message, Infallible>>();
        read_pump(conn.clone(), silent, hub.clone(), router, settings()).await;
        hub.flush().await;

        assert!(conn.is_closed());
        assert!(!hub.is_online(&identity()));
    }

    #[tokio::test]
    async fn test_read_pump_stops_when_connection_closed() {
        let (hub, router) = start_hub();
        let (conn, _rx) = Connection::new(identity(), "alice", 8);
        hub.register(conn.clone()).await;
        hub.flush().await;

        let silent = stream::pending::<Result<Message, Infallible>>();
        let task = tokio::spawn(read_pump(conn.clone(), silent, hub.clone(), router, settings()));
        conn.close();
        task.await.unwrap();
        hub.flush().await;

        assert!(!hub.is_online(&identity()));
    }

    #[tokio::test]
    async fn test_read_pump_skips_bad_frames_and_stops_on_close() {
        let (hub, router) = start_hub();
        let (conn, _rx) = Connection::new(identity(), "alice", 8);
        hub.register(conn.clone()).await;
        hub.flush().await;

        let frames = stream::iter(vec![
            Ok::<_, Infallible>(Message::Text("not json".into())),
            Ok(Message::Pong(Bytes::new())),
            Ok(Message::Close(None)),
            Ok(Message::Text("never read".into())),
        ]);
        read_pump(conn.clone(), frames, hub.clone(), router.clone(), settings()).await;
        hub.flush().await;

        assert_eq!(router.metrics().snapshot().frames_rejected, 1);
        assert!(!hub.is_online(&identity()));
    }
}
