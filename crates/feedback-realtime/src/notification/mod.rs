//! Service-side notifications: ticket and message activity pushed to
//! connected principals, with operator mirroring.

pub mod directory;
pub mod dispatcher;

pub use directory::{OperatorDirectory, StaticOperators};
pub use dispatcher::{DeliveryReport, Notifier, TicketParties};
