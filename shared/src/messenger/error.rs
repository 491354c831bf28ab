use thiserror::Error;

/// Errors that can occur while exchanging messages between windows
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessengerError {
    /// The remote window URL could not be parsed into an origin
    #[error("Invalid remote URL {url:?}: {reason}")]
    InvalidRemoteUrl {
        url: String,
        reason: String,
    },

    /// The remote window has an opaque origin, which can never be matched
    #[error("Remote URL {url:?} has an opaque origin and cannot be trusted")]
    OpaqueOrigin {
        url: String,
    },

    /// An outgoing payload could not be serialized
    #[error("Failed to serialize payload for event {event:?}: {reason}")]
    SerializationFailed {
        event: String,
        reason: String,
    },

    /// The target window rejected or could not accept the message
    #[error("Target window refused message for event {event:?}: {reason}")]
    PostFailed {
        event: String,
        reason: String,
    },
}
