//! Shared vocabulary types: principal identity and ticket codes.

pub mod identity;
pub mod ticket;

pub use identity::{IdentityKey, PrincipalId, PrincipalRole};
pub use ticket::{ContentType, TargetType, TicketStatus};
