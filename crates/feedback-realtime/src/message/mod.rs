//! WebSocket envelope types, codec, validation, and builders.

pub mod builder;
pub mod codec;
pub mod envelope;
pub mod types;
pub mod validator;

pub use codec::{CodecError, decode, encode};
pub use envelope::Envelope;
pub use types::{EventKind, Participant, Payload};
