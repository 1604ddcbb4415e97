//! Realtime hub metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Hub-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    evictions: AtomicU64,
    messages_delivered: AtomicU64,
    messages_dropped: AtomicU64,
    frames_received: AtomicU64,
    frames_rejected: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was registered.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection left the registry.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection was forcibly removed (superseded or backpressured).
    pub fn connection_evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame was queued on some outbound buffer.
    pub fn message_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame could not be queued.
    pub fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// An inbound frame arrived.
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// An inbound frame failed to decode.
    pub fn frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever registered.
    pub connections_opened: u64,
    /// Connections removed from the registry.
    pub connections_closed: u64,
    /// Forced removals.
    pub evictions: u64,
    /// Frames queued for delivery.
    pub messages_delivered: u64,
    /// Frames that found no room or no recipient buffer.
    pub messages_dropped: u64,
    /// Inbound frames read.
    pub frames_received: u64,
    /// Inbound frames that failed to decode.
    pub frames_rejected: u64,
}
