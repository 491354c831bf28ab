use thiserror::Error;

/// Errors that can occur while building URL policies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// An allowed base URL could not be parsed
    #[error("Allowed URL {url:?} is not a valid absolute URL: {reason}")]
    InvalidAllowedUrl {
        url: String,
        reason: String,
    },

    /// An allowed base URL has no host to match against
    #[error("Allowed URL {url:?} has no host")]
    MissingHost {
        url: String,
    },
}
