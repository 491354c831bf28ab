use std::time::Duration;

use log::debug;
use url::Url;

use livesync_shared::{strip_state_params, ActiveMap, Instant, Interval, ReadyPayload, StateParams};

use crate::{document::PreviewDocument, rewriter::parse_location};

/// Which panels, sections and controls apply to the page being previewed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveConstructs {
    pub panels: ActiveMap,
    pub sections: ActiveMap,
    pub controls: ActiveMap,
}

impl ActiveConstructs {
    pub fn ready_payload(&self, current_url: &str) -> ReadyPayload {
        ReadyPayload {
            current_url: current_url.to_string(),
            active_panels: self.panels.clone(),
            active_sections: self.sections.clone(),
            active_controls: self.controls.clone(),
        }
    }
}

/// One tick of the heartbeat
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Beat {
    /// The preview navigated without a reload; announce the new page
    Ready(ReadyPayload),
    KeepAlive,
}

/// Periodic liveness signal that also notices in-preview navigation.
///
/// Locations are compared with state parameters stripped, so a rewritten
/// URL and the page it points at count as the same location.
pub struct Heartbeat {
    interval: Interval,
    announced: Option<Url>,
}

impl Heartbeat {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            interval: Interval::new(period, now),
            announced: None,
        }
    }

    /// Build a `ready` announcement for the current location and remember
    /// it as the last announced one
    pub fn announce<D: PreviewDocument>(
        &mut self,
        document: &mut D,
        params: &StateParams,
        active: &ActiveConstructs,
    ) -> ReadyPayload {
        let url = restore_location(document, params);
        self.announced = url.as_ref().map(strip_state_params);
        let current = url.map(String::from).unwrap_or_else(|| document.location());
        active.ready_payload(&current)
    }

    pub fn poll<D: PreviewDocument>(
        &mut self,
        now: Instant,
        document: &mut D,
        params: &StateParams,
        active: &ActiveConstructs,
    ) -> Option<Beat> {
        if !self.interval.poll(now) {
            return None;
        }

        let url = restore_location(document, params)?;
        let current = strip_state_params(&url);
        if self.announced.as_ref() == Some(&current) {
            return Some(Beat::KeepAlive);
        }

        debug!("preview navigated to {}", current);
        Some(Beat::Ready(self.announce(document, params, active)))
    }

    pub fn cancel(&mut self) {
        self.interval.cancel();
    }

    pub fn restart(&mut self, now: Instant) {
        self.interval.restart(now);
    }
}

/// Put missing state parameters back into the document's own location
fn restore_location<D: PreviewDocument>(document: &mut D, params: &StateParams) -> Option<Url> {
    let mut url = parse_location(document)?;
    if !params.is_present_in(&url) {
        params.inject(&mut url);
        debug!("restoring state parameters in location {}", url);
        document.replace_location(url.as_str());
    }
    Some(url)
}
