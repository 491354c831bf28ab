use thiserror::Error;

use livesync_shared::{MessengerError, PolicyError};

/// Errors surfaced by the Preview API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// Messenger error
    #[error("Messenger error: {0}")]
    Messenger(#[from] MessengerError),

    /// Allow-list could not be built
    #[error("Preview URL policy error: {0}")]
    Policy(#[from] PolicyError),

    /// No partial with this id has been registered
    #[error("No partial named '{id}'")]
    UnknownPartial { id: String },

    /// The document reported a location that is not an absolute URL
    #[error("Document location '{url}' is not a valid URL: {reason}")]
    InvalidLocation { url: String, reason: String },
}
