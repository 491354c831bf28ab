use std::{collections::VecDeque, time::Duration};

use log::{debug, info, trace, warn};
use serde_json::Value;

use livesync_shared::{
    event, ChannelId, Envelope, Instant, MessengerError, Messaging, Messenger, ReadyPayload, Timer,
    WindowPort,
};

/// The pane's end of one preview window.
///
/// Messages sent before the preview has announced `ready` are held back and
/// flushed, in order, once it does. Silence longer than the configured
/// timeout marks the frame lost until it speaks again.
pub struct PreviewFrame {
    messenger: Messenger,
    ready: bool,
    outbox: VecDeque<(String, Value)>,
    heard: Timer,
    lost: bool,
    loading: bool,
    ready_payload: Option<ReadyPayload>,
}

impl PreviewFrame {
    pub fn new(
        remote_url: &str,
        channel: Option<ChannelId>,
        port: Box<dyn WindowPort>,
        timeout: Duration,
        now: Instant,
    ) -> Result<Self, MessengerError> {
        Ok(Self {
            messenger: Messenger::new(remote_url, channel, port)?,
            ready: false,
            outbox: VecDeque::new(),
            heard: Timer::new(timeout, now),
            lost: false,
            loading: false,
            ready_payload: None,
        })
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        self.messenger.channel()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// What the preview reported in its last `ready`
    pub fn ready_payload(&self) -> Option<&ReadyPayload> {
        self.ready_payload.as_ref()
    }

    pub fn queued_len(&self) -> usize {
        self.outbox.len()
    }

    /// Send now if the preview is ready, otherwise hold until it is
    pub fn send(&mut self, event: &str, data: Value) {
        if !self.ready && self.lost {
            trace!("preview {:?} is lost, dropping {:?}", self.channel(), event);
            return;
        }
        if !self.ready {
            debug!("preview {:?} not ready, queueing {:?}", self.channel(), event);
            self.outbox.push_back((event.to_string(), data));
            return;
        }
        // post failures are already logged by the messenger
        let _ = self.messenger.send_value(event, data);
    }

    /// Filter a raw incoming message through this frame's messenger
    pub(crate) fn receive(&mut self, raw: &str, origin: &str, now: Instant) -> Option<Envelope> {
        let envelope = self.messenger.receive(raw, origin)?;
        self.heard.reset(now);
        if self.lost {
            info!("preview {:?} is back", self.channel());
            self.lost = false;
        }
        Some(envelope)
    }

    /// The preview announced itself. Flushes everything held back.
    pub(crate) fn mark_ready(&mut self, payload: ReadyPayload) {
        self.ready_payload = Some(payload);
        self.loading = false;
        if self.ready {
            return;
        }
        self.ready = true;
        info!("preview {:?} ready", self.channel());
    }

    pub(crate) fn flush(&mut self) {
        while let Some((event, data)) = self.outbox.pop_front() {
            if let Err(err) = self.messenger.send_value(&event, data) {
                warn!("failed to flush queued {:?}: {}", event, err);
            }
        }
    }

    /// Start loading a new document; it must announce `ready` again
    pub(crate) fn begin_loading(&mut self, now: Instant) {
        if self.ready {
            let _ = self
                .messenger
                .send_value(event::LOADING_INITIATED, Value::Null);
        }
        self.ready = false;
        self.loading = true;
        self.heard.reset(now);
    }

    pub(crate) fn loading_failed(&mut self) {
        self.loading = false;
        self.ready = true;
        let _ = self
            .messenger
            .send_value(event::LOADING_FAILED, Value::Null);
        self.flush();
    }

    /// Returns true exactly once when the preview goes silent
    pub(crate) fn check_lost(&mut self, now: Instant) -> bool {
        if self.lost || !self.heard.ringing(now) {
            return false;
        }
        warn!("preview {:?} stopped answering", self.channel());
        self.lost = true;
        // a returning preview announces ready and is synced from the store
        if !self.outbox.is_empty() {
            debug!("dropping {} queued messages", self.outbox.len());
            self.outbox.clear();
        }
        true
    }
}
