//! # Livesync Pane
//! The control pane side of a live preview session: stages setting edits,
//! saves and publishes them as a changeset, and keeps any number of preview
//! windows in sync over their messenger channels.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use livesync_shared::{
        event, Bootstrap, ChangesetStatus, ChangesetUuid, ChannelId, Instant, Nonces,
        ReadyPayload, RequestError, RequestId, SaveErrorCode, ServerLink, ServerRequest,
        ServerResponse, SettingStore, Transport, WindowPort,
    };
}

mod config;
mod drawer;
mod error;
mod events;
mod pane;
mod preview_frame;
mod transaction;

pub use config::PaneConfig;
pub use drawer::{Drawer, DrawerManager, SearchRequest};
pub use error::{DrawerError, PaneError, TransactionError};
pub use events::{
    NoticeEvent, PaneEvent, PaneEvents, PreviewReadyEvent, ReloadEvent, SaveReport, SavedEvent,
    SessionNotice, TitleEvent,
};
pub use pane::ControlPane;
pub use preview_frame::PreviewFrame;
pub use transaction::{SaveOutcome, TransactionController, TransactionUpdate, SAVE_FAILED};
