//! # Livesync Shared
//! Common functionality shared between livesync-pane & livesync-preview crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

cfg_if! {
    if #[cfg(all(target_arch = "wasm32", not(feature = "wbindgen")))]
    {
        compile_error!("wasm target for 'livesync_shared' crate requires the 'wbindgen' feature to be enabled.");
    }
}

mod backends;
mod backoff;
mod bootstrap;
mod changeset;
mod endpoint;
mod events;
mod key_generator;
mod messenger;
mod preview_url;
mod protocol;
mod settings;
mod time;
mod timer;
mod types;

pub use backends::SystemClock;
pub use backoff::{Backoff, BackoffConfig};
pub use bootstrap::{Bootstrap, BootstrapError, BootstrapUrls, PartialDeclaration, ThemeInfo};
pub use changeset::{Changeset, ChangesetStatus};
pub use endpoint::{
    PartialError, PartialsRequest, PartialsResponse, PlacementContext, RequestError,
    SaveErrorCode, SaveRequest, SaveResponse, ServerLink, ServerRequest, ServerResponse,
    ServerResult,
};
pub use events::{Evented, Events, HandlerKey};
pub use key_generator::{KeyGenerator, RequestId};
pub use messenger::{
    envelope::Envelope,
    error::MessengerError,
    messenger::{Messaging, Messenger},
    port::{PostedMessage, QueuePort, WindowPort},
};
pub use preview_url::{
    error::PolicyError,
    policy::{PathRules, Previewability, PreviewUrlPolicy, Unpreviewable},
    state_params::{
        strip_state_params, StateParams, CHANGESET_UUID_PARAM, CHANNEL_PARAM, THEME_PARAM,
    },
};
pub use protocol::{
    decode, event,
    payload::{ActiveMap, Nonces, ReadyPayload, RenderedPayload, SavedPayload, SettingPayload},
    ProtocolError,
};
pub use settings::{
    error::SettingError,
    setting::{CreateOptions, Setting, SettingChange, Transport},
    store::{ObserverKey, SettingStore},
};
pub use time::{Clock, Instant, ManualClock};
pub use timer::{Debouncer, Interval, Timer};
pub use types::{ChangesetUuid, ChannelId, PartialId, SettingId};
