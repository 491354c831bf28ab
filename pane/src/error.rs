use thiserror::Error;

use livesync_shared::{
    ChangesetUuid, MessengerError, RequestError, SaveErrorCode, SettingError,
};

/// Why a save did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The changeset changed elsewhere; the session must be reloaded
    #[error("Changeset {uuid} is no longer valid, reload to continue editing")]
    Conflict { uuid: ChangesetUuid },
    #[error("Not allowed to save this changeset")]
    Unauthorized,
    /// A previous conflict or authorization failure ended the session
    #[error("Editing session is no longer valid ({code})")]
    SessionInvalid { code: SaveErrorCode },
    #[error("Save rejected by server: {code}")]
    Rejected { code: SaveErrorCode },
    #[error("Auth token refresh failed: {reason}")]
    NonceRefreshFailed { reason: String },
    #[error("Save failed in transit: {0}")]
    Transport(RequestError),
    #[error("Expected a {expected} response, got {got}")]
    UnexpectedResponse {
        expected: &'static str,
        got: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawerError {
    #[error("No drawer named '{id}'")]
    UnknownDrawer { id: String },
    #[error("Drawer '{id}' is already registered")]
    AlreadyRegistered { id: String },
}

/// Errors surfaced by the ControlPane API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaneError {
    /// Setting store error
    #[error("Setting error: {0}")]
    Setting(#[from] SettingError),

    /// Messenger error
    #[error("Messenger error: {0}")]
    Messenger(#[from] MessengerError),

    /// Save/publish error
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Drawer coordination error
    #[error("Drawer error: {0}")]
    Drawer(#[from] DrawerError),

    /// No preview window is registered for this channel
    #[error("No preview window on channel {channel:?}")]
    UnknownPreview { channel: Option<String> },
}
