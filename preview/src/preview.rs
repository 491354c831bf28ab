use std::collections::BTreeMap;

use log::{debug, info, trace, warn};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use livesync_shared::{
    decode, event, Bootstrap, ChangesetUuid, Evented, Events, Instant, Messenger,
    Nonces, PreviewUrlPolicy, RenderedPayload, RequestError, RequestId, SavedPayload, ServerLink,
    ServerResponse, SettingId, SettingPayload, SettingStore, WindowPort,
};

use crate::{
    config::PreviewConfig,
    document::{NodeId, PreviewDocument},
    error::PreviewError,
    heartbeat::{ActiveConstructs, Beat, Heartbeat},
    rewriter::{location_url, parse_location, LinkRewriter},
    selective_refresh::{
        engine::{RenderContext, SelectiveRefresh},
        partial::Partial,
    },
};

/// The preview window of an editing session.
///
/// Holds the preview's own setting store, applies values arriving from the
/// pane, keeps every link, form and request inside the document attached to
/// the pending changeset, and re-renders partials through the server.
/// Callers drive it the same way as the pane: raw messages go to `receive`,
/// server answers to `receive_response`, and `update` runs timers.
pub struct Preview<D: PreviewDocument> {
    messenger: Messenger,
    store: SettingStore,
    document: D,
    rewriter: LinkRewriter,
    heartbeat: Heartbeat,
    refresh: SelectiveRefresh,
    link: Box<dyn ServerLink>,
    nonces: Nonces,
    active: ActiveConstructs,
    loading: bool,
}

impl<D: PreviewDocument> Preview<D> {
    /// Start the preview and announce it to the pane at `pane_url`
    pub fn new(
        bootstrap: &Bootstrap,
        config: PreviewConfig,
        pane_url: &str,
        port: Box<dyn WindowPort>,
        link: Box<dyn ServerLink>,
        document: D,
        now: Instant,
    ) -> Result<Self, PreviewError> {
        location_url(&document)?;
        let messenger = Messenger::new(pane_url, bootstrap.channel.clone(), port)?;
        let policy = PreviewUrlPolicy::new(&bootstrap.allowed_urls)?;
        let secure_pane = Url::parse(pane_url)
            .map(|url| url.scheme() == "https")
            .unwrap_or(false);
        let rewriter =
            LinkRewriter::new(policy, bootstrap.state_params()).with_https_upgrade(secure_pane);

        let mut refresh = SelectiveRefresh::new(config.refresh_buffer, config.retry.clone());
        for (id, declaration) in &bootstrap.partials {
            refresh.add_partial(Partial::from_declaration(id, declaration));
        }

        let mut preview = Self {
            messenger,
            store: bootstrap.build_store(),
            document,
            rewriter,
            heartbeat: Heartbeat::new(config.keep_alive_interval, now),
            refresh,
            link,
            nonces: bootstrap.nonce.clone(),
            active: ActiveConstructs {
                panels: bootstrap.active_panels.clone(),
                sections: bootstrap.active_sections.clone(),
                controls: bootstrap.active_controls.clone(),
            },
            loading: false,
        };

        let uuid = preview.changeset_uuid().clone();
        preview
            .refresh
            .set_changeset_uuid(uuid, &mut preview.document, now);
        preview.rewriter.rewrite_all(&mut preview.document);
        let ready = preview.heartbeat.announce(
            &mut preview.document,
            preview.rewriter.params(),
            &preview.active,
        );
        info!("preview ready at {}", ready.current_url);
        preview.messenger.send(event::READY, &ready)?;

        Ok(preview)
    }

    pub fn store(&self) -> &SettingStore {
        &self.store
    }

    /// Direct access for observers. Changes made here are picked up on the
    /// next `update`.
    pub fn store_mut(&mut self) -> &mut SettingStore {
        &mut self.store
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.store.get(id)
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn changeset_uuid(&self) -> &ChangesetUuid {
        &self.rewriter.params().changeset_uuid
    }

    pub fn nonces(&self) -> &Nonces {
        &self.nonces
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether partial renders are scheduled, in flight or waiting to retry
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_busy()
    }

    /// Constructs reported with the next `ready`
    pub fn active_mut(&mut self) -> &mut ActiveConstructs {
        &mut self.active
    }

    pub fn add_partial(&mut self, partial: Partial) {
        self.refresh.add_partial(partial);
    }

    pub fn request_partial(&mut self, id: &str, now: Instant) -> Result<(), PreviewError> {
        self.refresh.request_partial(id, &mut self.document, now)
    }

    /// Handle one raw message posted to the preview's window. Returns
    /// whether it came from the pane.
    pub fn receive(&mut self, raw: &str, origin: &str, now: Instant) -> bool {
        let Some(envelope) = self.messenger.receive(raw, origin) else {
            return false;
        };
        self.handle(&envelope.event, &envelope.data, now);
        self.process_changes(now, false);
        true
    }

    /// Run timers: heartbeat, batched partial refreshes and their retries
    pub fn update(&mut self, now: Instant) {
        self.process_changes(now, false);

        match self.heartbeat.poll(
            now,
            &mut self.document,
            self.rewriter.params(),
            &self.active,
        ) {
            Some(Beat::Ready(payload)) => self.send(event::READY, &payload),
            Some(Beat::KeepAlive) => self.send(event::KEEP_ALIVE, &Value::Null),
            None => {}
        }

        let store = &self.store;
        let params = self.rewriter.params();
        let nonces = &self.nonces;
        self.refresh
            .update(now, &self.document, self.link.as_mut(), || RenderContext {
                changeset_uuid: params.changeset_uuid.clone(),
                nonce: nonces.get("preview").unwrap_or_default().to_string(),
                customized: store.dirty_values(),
            });
    }

    /// Feed back the result of a request posted through the server link.
    /// Returns false when the request was not one of the preview's.
    pub fn receive_response(
        &mut self,
        id: RequestId,
        result: Result<ServerResponse, RequestError>,
        now: Instant,
    ) -> bool {
        let Some(outcome) = self
            .refresh
            .receive_response(id, result, &mut self.document, now)
        else {
            return false;
        };

        for node in &outcome.inserted {
            self.rewriter.content_inserted(&mut self.document, *node);
        }
        if !outcome.rendered.is_empty() {
            let payload = RenderedPayload {
                partials: outcome.rendered,
            };
            self.send(event::PARTIAL_CONTENT_RENDERED, &payload);
        }
        if outcome.full_reload {
            warn!("selective refresh failed, asking for a full reload");
            self.send(event::REFRESH, &Value::Null);
        }
        true
    }

    /// The host inserted content below `node`; rewrite what it contains
    pub fn content_inserted(&mut self, node: NodeId) {
        self.rewriter.content_inserted(&mut self.document, node);
    }

    /// URL an outgoing request from the document should use, or `None` to
    /// send it unchanged
    pub fn prepare_request(&self, raw: &str) -> Option<String> {
        let base = parse_location(&self.document)?;
        self.rewriter.prepare_request(raw, &base)
    }

    fn handle(&mut self, name: &str, data: &Value, now: Instant) {
        match name {
            event::SETTING => match decode::<SettingPayload>(name, data) {
                Ok(SettingPayload(id, value)) => {
                    // ids the preview has never seen must still be saved
                    if self.store.set_or_create(&id, value, true) {
                        self.process_changes(now, true);
                    }
                }
                Err(err) => warn!("{}", err),
            },
            event::SETTINGS => match decode::<BTreeMap<SettingId, Value>>(name, data) {
                Ok(values) => {
                    for (id, value) in values {
                        self.store.set_or_create(&id, value, false);
                    }
                }
                Err(err) => warn!("{}", err),
            },
            event::SYNC => {
                let Some(entries) = data.as_object() else {
                    warn!("sync payload is not an object");
                    return;
                };
                for (inner, args) in entries {
                    self.messenger.trigger(inner, args);
                    self.handle(inner, args, now);
                }
                self.send(event::SYNCED, &Value::Null);
            }
            event::ACTIVE => {
                let title = self.document.title();
                let scroll = self.document.scroll();
                let nonces = self.nonces.clone();
                self.send(event::NONCE, &nonces);
                self.send(event::DOCUMENT_TITLE, &title);
                self.send(event::SCROLL, &scroll);
            }
            event::SAVED => match decode::<SavedPayload>(name, data) {
                Ok(payload) => {
                    self.store.mark_saved(&payload.saved);
                    if let Some(uuid) = payload.next_changeset_uuid {
                        self.swap_changeset(uuid, now);
                    }
                }
                Err(err) => warn!("{}", err),
            },
            event::NONCE_REFRESH => match decode::<Nonces>(name, data) {
                Ok(nonces) => self.nonces.merge(&nonces),
                Err(err) => warn!("{}", err),
            },
            event::LOADING_INITIATED => {
                debug!("pane started loading a new preview");
                self.loading = true;
                self.heartbeat.cancel();
            }
            event::LOADING_FAILED => {
                debug!("preview load failed, staying on current page");
                self.loading = false;
                self.heartbeat.restart(now);
            }
            event::SCROLL => match data.as_i64() {
                Some(scroll) => self.document.set_scroll(scroll),
                None => warn!("scroll payload is not an integer"),
            },
            other => trace!("unhandled event {:?}", other),
        }
    }

    /// Route store changes to partials. With `live`, a change nothing can
    /// render in place asks the pane for a full reload.
    fn process_changes(&mut self, now: Instant, live: bool) {
        for change in self.store.drain_changes() {
            let scheduled = self
                .refresh
                .schedule_setting(&change.id, &mut self.document, now);
            if scheduled > 0 || !live || self.store.has_observers(&change.id) {
                continue;
            }
            debug!("nothing renders {:?} in place, requesting reload", change.id);
            self.send(event::REFRESH, &Value::Null);
        }
    }

    fn swap_changeset(&mut self, uuid: ChangesetUuid, now: Instant) {
        info!(
            "changeset {} published, continuing in {}",
            self.changeset_uuid(),
            uuid
        );
        self.rewriter.set_changeset_uuid(uuid.clone());
        self.refresh
            .set_changeset_uuid(uuid, &mut self.document, now);
        self.rewriter.rewrite_all(&mut self.document);
        self.rewriter.stamp_location(&mut self.document);
    }

    fn send<T: Serialize + ?Sized>(&mut self, name: &str, data: &T) {
        if let Err(err) = self.messenger.send(name, data) {
            warn!("could not send {:?} to the pane: {}", name, err);
        }
    }
}

impl<D: PreviewDocument> Evented for Preview<D> {
    fn events_mut(&mut self) -> &mut Events {
        self.messenger.events_mut()
    }
}
