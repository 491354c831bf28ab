use std::{default::Default, time::Duration};

use livesync_shared::BackoffConfig;

/// Contains Config properties which will be used by the Preview
#[derive(Clone, Debug)]
pub struct PreviewConfig {
    /// How often the preview reports to the pane that it is alive
    pub keep_alive_interval: Duration,
    /// Setting changes within this window are batched into one
    /// selective-refresh request
    pub refresh_buffer: Duration,
    /// Retry policy for selective-refresh requests that fail in transit
    pub retry: BackoffConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: Duration::from_secs(1),
            refresh_buffer: Duration::from_millis(250),
            retry: BackoffConfig::default(),
        }
    }
}
