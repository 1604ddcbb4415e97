//! JSON encoding and decoding of envelopes.

use std::sync::Arc;

use thiserror::Error;

use super::envelope::{Envelope, RawEnvelope};
use super::types::EventKind;
use super::validator;

/// Why an inbound frame could not be turned into an [`Envelope`].
///
/// Every variant is recoverable: the read pump logs it and keeps reading.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame exceeded the configured size limit.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Actual size.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// The frame was blank after normalization.
    #[error("empty frame")]
    EmptyFrame,
    /// The frame was not a JSON object of the envelope shape.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The `event` field named a kind this hub does not know.
    #[error("unknown event kind '{0}'")]
    UnknownEvent(String),
    /// A kind that requires `data` arrived without it.
    #[error("event '{0}' requires a data object")]
    MissingPayload(EventKind),
    /// `data` did not match the shape required by the event kind.
    #[error("invalid data for event '{kind}': {source}")]
    InvalidPayload {
        /// Event kind whose payload failed to decode.
        kind: EventKind,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A read receipt named neither or both of message and ticket.
    #[error("read receipt must carry exactly one of message_id or ticket_id")]
    AmbiguousReadReceipt,
}

/// Encode an envelope into a shareable text frame.
pub fn encode(envelope: &Envelope) -> Result<Arc<str>, serde_json::Error> {
    serde_json::to_string(envelope).map(Arc::from)
}

/// Decode one inbound frame.
///
/// The frame is normalized (newlines flattened, surrounding whitespace
/// trimmed) and size-checked before parsing.
pub fn decode(raw: &str, max_frame_bytes: usize) -> Result<Envelope, CodecError> {
    validator::validate_frame(raw, max_frame_bytes)?;
    let normalized = validator::normalize(raw);
    if normalized.is_empty() {
        return Err(CodecError::EmptyFrame);
    }
    let raw: RawEnvelope = serde_json::from_str(&normalized).map_err(CodecError::Malformed)?;
    Envelope::try_from(raw)
}
