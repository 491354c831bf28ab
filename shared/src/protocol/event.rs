//! Names of the events exchanged between the control pane and a preview.

/// pane → preview: `[id, value]`, a single setting changed
pub const SETTING: &str = "setting";
/// pane → preview: `{id: value}`, bulk values (unknown ids are created clean)
pub const SETTINGS: &str = "settings";
/// pane → preview: `{event: args}` replayed locally, answered with `synced`
pub const SYNC: &str = "sync";
/// pane → preview: the pane has finished syncing a freshly loaded preview
pub const ACTIVE: &str = "active";
/// pane → preview: a save completed, see `SavedPayload`
pub const SAVED: &str = "saved";
/// pane → preview: refreshed auth tokens
pub const NONCE_REFRESH: &str = "nonce-refresh";
/// pane → preview: the pane started loading a new preview URL
pub const LOADING_INITIATED: &str = "loading-initiated";
/// pane → preview: loading the new preview URL failed
pub const LOADING_FAILED: &str = "loading-failed";
/// both ways: scroll offset
pub const SCROLL: &str = "scroll";

/// preview → pane: preview loaded or navigated, see `ReadyPayload`
pub const READY: &str = "ready";
/// preview → pane: periodic liveness signal
pub const KEEP_ALIVE: &str = "keep-alive";
/// preview → pane: reply to `sync`
pub const SYNCED: &str = "synced";
/// preview → pane: the preview's current auth tokens
pub const NONCE: &str = "nonce";
/// preview → pane: document title of the previewed page
pub const DOCUMENT_TITLE: &str = "documentTitle";
/// preview → pane: request a full reload of the preview
pub const REFRESH: &str = "refresh";
/// preview → pane: partials finished rendering new content
pub const PARTIAL_CONTENT_RENDERED: &str = "partial-content-rendered";
