use std::mem;

use log::{debug, info, trace, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use livesync_shared::{
    decode, event, Bootstrap, ChangesetStatus, ChannelId, CreateOptions, Debouncer, Instant,
    Nonces, ReadyPayload, RequestError, RequestId, SavedPayload, ServerLink, ServerResponse,
    SettingPayload, SettingStore, Transport, WindowPort,
};

use crate::{
    config::PaneConfig,
    drawer::DrawerManager,
    error::PaneError,
    events::{PaneEvents, SessionNotice},
    preview_frame::PreviewFrame,
    transaction::{SaveOutcome, TransactionController, TransactionUpdate},
};

/// The control pane of an editing session.
///
/// Owns the pane's setting store and the transaction controller, and keeps
/// every registered preview window in sync with them. Nothing here blocks
/// or reads a clock: callers pass `now`, feed in raw window messages with
/// `receive` and server answers with `receive_response`, and call `update`
/// periodically to run timers.
pub struct ControlPane {
    config: PaneConfig,
    store: SettingStore,
    transaction: TransactionController,
    frames: Vec<PreviewFrame>,
    drawers: DrawerManager,
    link: Box<dyn ServerLink>,
    events: PaneEvents,
    reload: Debouncer,
    reload_pending: Vec<Option<ChannelId>>,
    scroll: i64,
}

impl ControlPane {
    pub fn new(bootstrap: &Bootstrap, config: PaneConfig, link: Box<dyn ServerLink>) -> Self {
        let transaction = TransactionController::new(
            bootstrap.changeset.clone(),
            bootstrap.nonce.clone(),
            config.autosave_delay,
        )
        .with_concurrent_saves(config.allow_concurrent_saves);
        let reload = Debouncer::new(config.refresh_debounce);

        Self {
            store: bootstrap.build_store(),
            transaction,
            frames: Vec::new(),
            drawers: DrawerManager::new(),
            link,
            events: PaneEvents::new(),
            reload,
            reload_pending: Vec::new(),
            scroll: 0,
            config,
        }
    }

    /// Register a preview window. `remote_url` is the URL loaded into it.
    pub fn add_preview(
        &mut self,
        remote_url: &str,
        channel: Option<ChannelId>,
        port: Box<dyn WindowPort>,
        now: Instant,
    ) -> Result<(), PaneError> {
        let frame = PreviewFrame::new(remote_url, channel, port, self.config.preview_timeout, now)?;
        debug!("registered preview {:?}", frame.channel());
        self.frames.push(frame);
        Ok(())
    }

    pub fn remove_preview(&mut self, channel: Option<&ChannelId>) -> bool {
        let before = self.frames.len();
        self.frames.retain(|frame| frame.channel() != channel);
        self.frames.len() != before
    }

    pub fn preview(&self, channel: Option<&ChannelId>) -> Option<&PreviewFrame> {
        self.frames.iter().find(|frame| frame.channel() == channel)
    }

    pub fn store(&self) -> &SettingStore {
        &self.store
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.store.get(id)
    }

    pub fn transaction(&self) -> &TransactionController {
        &self.transaction
    }

    pub fn drawers(&self) -> &DrawerManager {
        &self.drawers
    }

    pub fn drawers_mut(&mut self) -> &mut DrawerManager {
        &mut self.drawers
    }

    pub fn config(&self) -> &PaneConfig {
        &self.config
    }

    pub fn set_scroll(&mut self, scroll: i64) {
        self.scroll = scroll;
        self.broadcast(event::SCROLL, Value::from(scroll));
    }

    /// Change a setting from the pane's UI. Unknown ids are created unsaved.
    pub fn set(&mut self, id: &str, value: Value, now: Instant) -> Result<bool, PaneError> {
        let changed = self.transaction.stage(&mut self.store, id, value, now)?;
        self.broadcast_changes(now);
        Ok(changed)
    }

    pub fn create(
        &mut self,
        id: &str,
        value: Value,
        options: CreateOptions,
        now: Instant,
    ) -> Result<(), PaneError> {
        self.store.create(id, value, options)?;
        self.broadcast_changes(now);
        Ok(())
    }

    pub fn save(&mut self, status: ChangesetStatus) -> Result<SaveOutcome, PaneError> {
        let outcome = self
            .transaction
            .save(status, &self.store, self.link.as_mut())?;
        Ok(outcome)
    }

    /// Feed back the result of a request posted through the server link
    pub fn receive_response(
        &mut self,
        id: RequestId,
        result: Result<ServerResponse, RequestError>,
        now: Instant,
    ) {
        let Some(update) =
            self.transaction
                .receive_response(id, result, &mut self.store, self.link.as_mut())
        else {
            warn!("response to unknown request {}", id);
            return;
        };

        // sanitized values go out before the `saved` that confirms them
        self.broadcast_changes(now);

        match update {
            TransactionUpdate::Saved {
                report,
                saved,
                invalid,
            } => {
                let payload = SavedPayload {
                    next_changeset_uuid: (report.current_uuid != report.saved_uuid)
                        .then(|| report.current_uuid.clone()),
                    saved,
                };
                self.broadcast(event::SAVED, to_data(&payload));
                for (id, message) in invalid {
                    self.events
                        .push_notice(SessionNotice::InvalidSetting { id, message });
                }
                if report.status.is_published() {
                    info!("changeset {} published", report.saved_uuid);
                }
                self.events.push_save(report);
            }
            TransactionUpdate::Failed(error) => {
                self.events.push_notice(SessionNotice::SaveFailed(error));
            }
            TransactionUpdate::NoncesRefreshed(nonces) => {
                self.broadcast(event::NONCE_REFRESH, to_data(&nonces));
            }
            TransactionUpdate::RefreshingNonces | TransactionUpdate::Stale => {}
        }
    }

    /// Handle one raw message posted to the pane's window. Returns whether
    /// any preview accepted it.
    pub fn receive(&mut self, raw: &str, origin: &str, now: Instant) -> bool {
        let mut accepted = false;
        for index in 0..self.frames.len() {
            if let Some(envelope) = self.frames[index].receive(raw, origin, now) {
                accepted = true;
                self.handle(index, &envelope.event, &envelope.data, now);
            }
        }
        if !accepted {
            trace!("message not accepted by any preview");
        }
        accepted
    }

    /// Run timers: autosave, preview liveness and coalesced reloads
    pub fn update(&mut self, now: Instant) {
        if let Some(result) = self
            .transaction
            .update(now, &self.store, self.link.as_mut())
        {
            match result {
                Ok(outcome) => debug!("autosave: {:?}", outcome),
                Err(error) => self.events.push_notice(SessionNotice::SaveFailed(error)),
            }
        }

        for frame in &mut self.frames {
            if frame.check_lost(now) {
                self.events.push_notice(SessionNotice::PreviewLost {
                    channel: frame.channel().cloned(),
                });
            }
        }

        if self.reload.poll(now) {
            self.reload_now(now);
        }
    }

    /// The host is navigating the preview on `channel` to a new URL
    pub fn load_url(&mut self, channel: Option<&ChannelId>, now: Instant) -> Result<(), PaneError> {
        let index = self.frame_index(channel)?;
        self.frames[index].begin_loading(now);
        Ok(())
    }

    pub fn loading_failed(&mut self, channel: Option<&ChannelId>) -> Result<(), PaneError> {
        let index = self.frame_index(channel)?;
        self.frames[index].loading_failed();
        Ok(())
    }

    /// Request a full reload of the preview on `channel`, or of every
    /// preview with `None`. Requests within the debounce window coalesce.
    pub fn request_reload(&mut self, channel: Option<ChannelId>, now: Instant) {
        if !self.reload_pending.contains(&channel) {
            self.reload_pending.push(channel);
        }
        self.reload.schedule(now);
    }

    pub fn take_events(&mut self) -> PaneEvents {
        mem::take(&mut self.events)
    }

    fn handle(&mut self, index: usize, name: &str, data: &Value, now: Instant) {
        let channel = self.frames[index].channel().cloned();
        match name {
            event::READY => match decode::<ReadyPayload>(name, data) {
                Ok(payload) => self.preview_ready(index, payload),
                Err(err) => warn!("{}", err),
            },
            event::KEEP_ALIVE => {}
            event::SYNCED => debug!("preview {:?} synced", channel),
            event::NONCE => match decode::<Nonces>(name, data) {
                Ok(nonces) => self.transaction.merge_nonces(&nonces),
                Err(err) => warn!("{}", err),
            },
            event::DOCUMENT_TITLE => match decode::<String>(name, data) {
                Ok(title) => self.events.push_title(channel, title),
                Err(err) => warn!("{}", err),
            },
            event::SCROLL => {
                if let Some(scroll) = data.as_i64() {
                    self.scroll = scroll;
                }
            }
            event::REFRESH => self.request_reload(channel, now),
            event::PARTIAL_CONTENT_RENDERED => debug!("preview {:?} rendered partials", channel),
            event::SETTING => match decode::<SettingPayload>(name, data) {
                Ok(SettingPayload(id, value)) => {
                    if let Err(err) = self.set(&id, value, now) {
                        warn!("setting from preview rejected: {}", err);
                    }
                }
                Err(err) => warn!("{}", err),
            },
            other => trace!("unhandled event {:?} from preview {:?}", other, channel),
        }
    }

    fn preview_ready(&mut self, index: usize, payload: ReadyPayload) {
        let mut sync = Map::new();
        sync.insert(event::SETTINGS.to_string(), to_data(&self.store.dirty_values()));
        sync.insert(event::SCROLL.to_string(), Value::from(self.scroll));
        let sync = Value::Object(sync);
        let channel = self.frames[index].channel().cloned();

        let frame = &mut self.frames[index];
        frame.mark_ready(payload.clone());
        frame.send(event::SYNC, sync);
        frame.flush();
        frame.send(event::ACTIVE, Value::Null);

        self.events.push_ready(channel, payload);
    }

    /// Forward everything the store recorded to the previews
    fn broadcast_changes(&mut self, now: Instant) {
        for change in self.store.drain_changes() {
            match self.store.transport(&change.id).unwrap_or_default() {
                Transport::PostMessage => {
                    let payload = SettingPayload(change.id, change.value);
                    self.broadcast(event::SETTING, to_data(&payload));
                }
                Transport::Refresh => self.request_reload(None, now),
            }
        }
    }

    fn broadcast(&mut self, name: &str, data: Value) {
        for frame in &mut self.frames {
            frame.send(name, data.clone());
        }
    }

    fn reload_now(&mut self, now: Instant) {
        let pending = mem::take(&mut self.reload_pending);
        let everything = pending.iter().any(Option::is_none);
        for frame in &mut self.frames {
            let channel = frame.channel().cloned();
            if everything || pending.contains(&channel) {
                debug!("reloading preview {:?}", channel);
                frame.begin_loading(now);
                self.events.push_reload(channel);
            }
        }
    }

    fn frame_index(&self, channel: Option<&ChannelId>) -> Result<usize, PaneError> {
        self.frames
            .iter()
            .position(|frame| frame.channel() == channel)
            .ok_or_else(|| PaneError::UnknownPreview {
                channel: channel.map(ToString::to_string),
            })
    }
}

fn to_data<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}
