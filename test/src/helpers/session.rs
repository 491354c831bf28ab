/// Test harness wiring a control pane and one preview together
/// Messages only move when `exchange` is called, so tests can observe every
/// intermediate state

use std::time::Duration;

use livesync_pane::{ControlPane, PaneConfig};
use livesync_preview::{Preview, PreviewConfig};
use livesync_shared::{Bootstrap, ChannelId, Clock, Instant, ManualClock};

use crate::{
    helpers::{
        bootstrap::{sample_bootstrap, sample_document},
        mock_server::MockServer,
    },
    local_window::{LocalWindowPair, PANE_URL, PREVIEW_URL},
    test_document::TestDocument,
};

// generous bound; a healthy exchange settles in a handful of rounds
const MAX_ROUNDS: usize = 32;

pub struct Session {
    pub clock: ManualClock,
    pub windows: LocalWindowPair,
    pub pane: ControlPane,
    pub preview: Preview<TestDocument>,
    pub pane_server: MockServer,
    pub preview_server: MockServer,
    channel: Option<ChannelId>,
}

impl Session {
    pub fn new(bootstrap: &Bootstrap, document: TestDocument) -> Self {
        Self::with_config(
            bootstrap,
            document,
            PaneConfig::default(),
            PreviewConfig::default(),
        )
    }

    pub fn with_config(
        bootstrap: &Bootstrap,
        document: TestDocument,
        pane_config: PaneConfig,
        preview_config: PreviewConfig,
    ) -> Self {
        let clock = ManualClock::new();
        let windows = LocalWindowPair::new();
        let pane_server = MockServer::new();
        let preview_server = MockServer::new();

        let mut pane = ControlPane::new(bootstrap, pane_config, pane_server.link());
        pane.add_preview(
            PREVIEW_URL,
            bootstrap.channel.clone(),
            windows.pane_port(),
            clock.now(),
        )
        .expect("preview registers");

        let preview = Preview::new(
            bootstrap,
            preview_config,
            PANE_URL,
            windows.preview_port(),
            preview_server.link(),
            document,
            clock.now(),
        )
        .expect("preview starts");

        Self {
            clock,
            windows,
            pane,
            preview,
            pane_server,
            preview_server,
            channel: bootstrap.channel.clone(),
        }
    }

    /// The sample site under `uuid`, handshake done and startup events
    /// drained
    pub fn started(uuid: &str) -> Self {
        let mut session = Self::new(&sample_bootstrap(uuid), sample_document(uuid));
        session.exchange();
        session.pane.take_events();
        session
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        self.channel.as_ref()
    }

    /// Deliver messages both ways until neither window has anything left
    pub fn exchange(&mut self) {
        let now = self.now();
        for _ in 0..MAX_ROUNDS {
            if self.windows.is_idle() {
                return;
            }
            for message in self.windows.take_for_pane() {
                self.pane.receive(&message.data, &message.origin, now);
            }
            for message in self.windows.take_for_preview() {
                self.preview.receive(&message.data, &message.origin, now);
            }
        }
        panic!("windows kept talking after {} rounds", MAX_ROUNDS);
    }

    /// Move time forward, run both windows' timers and settle messages
    pub fn advance(&mut self, duration: Duration) {
        let now = self.clock.advance(duration);
        self.pane.update(now);
        self.preview.update(now);
        self.exchange();
    }
}
