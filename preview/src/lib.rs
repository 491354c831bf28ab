//! # Livesync Preview
//! The preview side of a live preview session: applies pending setting
//! values, keeps navigation inside the document attached to the changeset
//! being edited, and re-renders partial regions without a full reload.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use livesync_shared::{
        event, Bootstrap, ChangesetUuid, ChannelId, Evented, Instant, Nonces, PartialsResponse,
        RequestError, RequestId, ServerLink, ServerRequest, ServerResponse, SettingStore,
        StateParams, WindowPort,
    };
}

mod config;
mod document;
mod error;
mod heartbeat;
mod preview;
mod rewriter;
mod selective_refresh;

pub use config::PreviewConfig;
pub use document::{NodeId, PreviewDocument};
pub use error::PreviewError;
pub use heartbeat::{ActiveConstructs, Beat, Heartbeat};
pub use preview::Preview;
pub use rewriter::{LinkRewriter, UNPREVIEWABLE_CLASS};
pub use selective_refresh::{
    engine::{RefreshOutcome, RenderContext, SelectiveRefresh, REFRESHING_CLASS},
    partial::Partial,
    placement::{find_placements, Placement, CONTEXT_ATTRIBUTE},
};
