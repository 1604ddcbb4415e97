//! # feedback-realtime
//!
//! Realtime WebSocket hub for the feedback platform. Provides:
//!
//! - Connection handles with a bounded outbound buffer and idempotent close
//! - Read and write pumps with heartbeat-driven liveness
//! - An identity-keyed registry allowing one live connection per principal
//! - Inbound event routing (unicast to a declared receiver, or broadcast)
//! - Service-side notifications for ticket and message activity

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod router;
pub mod server;

pub use connection::handle::Connection;
pub use hub::Hub;
pub use notification::dispatcher::Notifier;
pub use router::EventRouter;
pub use server::RealtimeEngine;
