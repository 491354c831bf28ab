use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the ControlPane
#[derive(Clone, Debug)]
pub struct PaneConfig {
    /// Quiet period after the last staged edit before a draft is saved
    /// automatically. Zero disables autosave.
    pub autosave_delay: Duration,
    /// A preview that sends neither `ready` nor `keep-alive` for this long is
    /// reported lost
    pub preview_timeout: Duration,
    /// Full reloads requested within this window are coalesced into one
    pub refresh_debounce: Duration,
    /// Whether `save` may post while another save is still in flight. When
    /// false, the later save is queued and sent once the first completes.
    pub allow_concurrent_saves: bool,
}

impl PaneConfig {
    pub fn autosave_enabled(&self) -> bool {
        !self.autosave_delay.is_zero()
    }
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_secs(5),
            preview_timeout: Duration::from_secs(5),
            refresh_debounce: Duration::from_millis(250),
            allow_concurrent_saves: false,
        }
    }
}
