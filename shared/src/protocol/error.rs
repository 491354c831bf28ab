use thiserror::Error;

/// Errors that can occur while decoding an event payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The event arrived but its data did not have the expected shape
    #[error("Malformed payload for event '{event}': {reason}")]
    MalformedPayload { event: String, reason: String },
}
