use std::{collections::BTreeMap, time::Duration};

use log::{debug, info, warn};
use serde_json::Value;

use livesync_shared::{
    event, Changeset, ChangesetStatus, ChangesetUuid, CreateOptions, Debouncer, Evented, Events,
    Instant, KeyGenerator, Nonces, RequestError, RequestId, SaveErrorCode, SaveRequest,
    SaveResponse, SavedPayload, ServerLink, ServerRequest, ServerResponse, SettingError,
    SettingId, SettingStore,
};

use crate::{error::TransactionError, events::SaveReport};

/// Local event triggered when a save fails for good, with the error message
pub const SAVE_FAILED: &str = "save-failed";

/// What `save` did with the request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Sent(RequestId),
    /// Another save is in flight; this one goes out when it completes
    Queued,
    NothingToSave,
}

/// Result of feeding a server response to the controller
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionUpdate {
    Saved {
        report: SaveReport,
        /// Persisted value of every cleaned setting
        saved: BTreeMap<SettingId, Value>,
        /// Settings the server refused, with its message
        invalid: BTreeMap<SettingId, String>,
    },
    Failed(TransactionError),
    /// The auth token expired; fresh tokens were requested and the save
    /// will be re-sent once they arrive
    RefreshingNonces,
    /// Tokens were refreshed and the save re-sent with them
    NoncesRefreshed(Nonces),
    /// The response belonged to a changeset that is no longer current
    Stale,
}

struct PendingSave {
    id: RequestId,
    request: SaveRequest,
    nonce_retried: bool,
}

/// Owns the save/publish protocol for one editing session.
///
/// Exactly one changeset is current at a time. Every save carries its uuid,
/// and a response is only applied while that uuid is still current, so a
/// publish that opens a new changeset voids whatever was in flight against
/// the old one. Values stay in the store until the server confirms them;
/// no failure path discards an edit.
pub struct TransactionController {
    changeset: Changeset,
    nonces: Nonces,
    keys: KeyGenerator,
    in_flight: Vec<PendingSave>,
    refreshing_nonces: Option<(RequestId, PendingSave)>,
    queued: Option<ChangesetStatus>,
    autosave: Option<Debouncer>,
    allow_concurrent_saves: bool,
    terminal: Option<SaveErrorCode>,
    validities: BTreeMap<SettingId, String>,
    events: Events,
}

impl TransactionController {
    pub fn new(changeset: Changeset, nonces: Nonces, autosave_delay: Duration) -> Self {
        let autosave = if autosave_delay.is_zero() {
            None
        } else {
            Some(Debouncer::new(autosave_delay))
        };
        Self {
            changeset,
            nonces,
            keys: KeyGenerator::new(),
            in_flight: Vec::new(),
            refreshing_nonces: None,
            queued: None,
            autosave,
            allow_concurrent_saves: false,
            terminal: None,
            validities: BTreeMap::new(),
            events: Events::new(),
        }
    }

    pub fn with_concurrent_saves(mut self, allow: bool) -> Self {
        self.allow_concurrent_saves = allow;
        self
    }

    pub fn changeset(&self) -> &Changeset {
        &self.changeset
    }

    pub fn uuid(&self) -> &ChangesetUuid {
        &self.changeset.uuid
    }

    pub fn nonces(&self) -> &Nonces {
        &self.nonces
    }

    pub fn merge_nonces(&mut self, nonces: &Nonces) {
        self.nonces.merge(nonces);
    }

    pub fn is_saving(&self) -> bool {
        !self.in_flight.is_empty() || self.refreshing_nonces.is_some()
    }

    /// Whether an earlier failure ended the session
    pub fn is_session_valid(&self) -> bool {
        self.terminal.is_none()
    }

    /// Validation message the server gave for a setting in the last save
    /// that included it
    pub fn validity(&self, id: &str) -> Option<&str> {
        self.validities.get(id).map(String::as_str)
    }

    /// Put a value into the pending changeset without contacting the
    /// server. Unknown ids are created unsaved. Returns whether the store
    /// changed.
    pub fn stage(
        &mut self,
        store: &mut SettingStore,
        id: &str,
        value: Value,
        now: Instant,
    ) -> Result<bool, SettingError> {
        let changed = if store.contains(id) {
            store.set(id, value)?
        } else {
            store.create(id, value, CreateOptions::dirty())?;
            true
        };
        if changed {
            if let Some(autosave) = &mut self.autosave {
                autosave.schedule(now);
            }
        }
        Ok(changed)
    }

    /// Post every dirty setting to the server under the current uuid.
    ///
    /// Publishing an unchanged changeset is allowed; a draft save with
    /// nothing dirty is skipped.
    pub fn save(
        &mut self,
        status: ChangesetStatus,
        store: &SettingStore,
        link: &mut dyn ServerLink,
    ) -> Result<SaveOutcome, TransactionError> {
        if let Some(code) = &self.terminal {
            return Err(TransactionError::SessionInvalid { code: code.clone() });
        }

        if self.is_saving() && !self.allow_concurrent_saves {
            debug!("save in flight, queueing {:?} save", status);
            self.queued = Some(stronger(self.queued, status));
            return Ok(SaveOutcome::Queued);
        }

        let settings = store.dirty_values();
        if settings.is_empty() && !status.is_published() {
            return Ok(SaveOutcome::NothingToSave);
        }

        if let Some(autosave) = &mut self.autosave {
            autosave.cancel();
        }

        let request = SaveRequest {
            changeset_uuid: self.changeset.uuid.clone(),
            status,
            settings,
            nonce: self.nonces.get("save").unwrap_or_default().to_string(),
        };
        let id = self.post(request, false, link);
        Ok(SaveOutcome::Sent(id))
    }

    /// Fire an autosave once edits have been quiet for the configured delay
    pub fn update(
        &mut self,
        now: Instant,
        store: &SettingStore,
        link: &mut dyn ServerLink,
    ) -> Option<Result<SaveOutcome, TransactionError>> {
        let due = self
            .autosave
            .as_mut()
            .is_some_and(|autosave| autosave.poll(now));
        if !due || !self.is_session_valid() || store.dirty_ids().is_empty() {
            return None;
        }
        debug!("autosaving changeset {}", self.changeset.uuid);
        Some(self.save(ChangesetStatus::Draft, store, link))
    }

    /// Feed back the outcome of a request this controller posted. Returns
    /// `None` when `id` is not one of its requests.
    pub fn receive_response(
        &mut self,
        id: RequestId,
        result: Result<ServerResponse, RequestError>,
        store: &mut SettingStore,
        link: &mut dyn ServerLink,
    ) -> Option<TransactionUpdate> {
        let refresh_answered = self
            .refreshing_nonces
            .as_ref()
            .is_some_and(|(refresh_id, _)| *refresh_id == id);
        if refresh_answered {
            let update = self.receive_nonces(result, link);
            self.send_queued(store, link);
            return Some(update);
        }

        let index = self.in_flight.iter().position(|pending| pending.id == id)?;
        let pending = self.in_flight.remove(index);

        let update = match result {
            Ok(ServerResponse::Saved(response)) => self.receive_saved(pending, response, store),
            Ok(ServerResponse::SaveRejected { code }) => self.receive_rejected(pending, code, link),
            Ok(other) => self.fail(TransactionError::UnexpectedResponse {
                expected: "save",
                got: response_kind(&other),
            }),
            Err(err) => {
                warn!("save {} failed in transit: {}", id, err);
                self.fail(TransactionError::Transport(err))
            }
        };

        self.send_queued(store, link);
        Some(update)
    }

    fn post(&mut self, request: SaveRequest, nonce_retried: bool, link: &mut dyn ServerLink) -> RequestId {
        let id = self.keys.generate();
        debug!(
            "posting {:?} save {} for changeset {} ({} settings)",
            request.status,
            id,
            request.changeset_uuid,
            request.settings.len()
        );
        link.post(id, ServerRequest::Save(request.clone()));
        self.in_flight.push(PendingSave {
            id,
            request,
            nonce_retried,
        });
        id
    }

    fn receive_saved(
        &mut self,
        pending: PendingSave,
        response: SaveResponse,
        store: &mut SettingStore,
    ) -> TransactionUpdate {
        let request = pending.request;
        if request.changeset_uuid != self.changeset.uuid {
            warn!(
                "ignoring save response for changeset {}, current is {}",
                request.changeset_uuid, self.changeset.uuid
            );
            return TransactionUpdate::Stale;
        }
        if !request.status.is_published() && response.changeset_uuid != request.changeset_uuid {
            warn!(
                "ignoring draft save answered with changeset {}",
                response.changeset_uuid
            );
            return TransactionUpdate::Stale;
        }

        let invalid = response.setting_validities;
        let accepted: BTreeMap<SettingId, Value> = request
            .settings
            .into_iter()
            .filter(|(id, _)| !invalid.contains_key(id))
            .collect();
        let cleaned = store.reconcile_saved(&accepted, &response.sanitized_settings);
        for id in accepted.keys() {
            self.validities.remove(id);
        }
        for (id, message) in &invalid {
            debug!("setting {:?} rejected: {}", id, message);
            self.validities.insert(id.clone(), message.clone());
        }

        let saved_uuid = self.changeset.uuid.clone();
        if request.status.is_published() && response.changeset_uuid != saved_uuid {
            info!(
                "published changeset {}, continuing in {}",
                saved_uuid, response.changeset_uuid
            );
            self.changeset = Changeset::new(response.changeset_uuid);
        } else {
            self.changeset.status = request.status;
        }

        let saved: BTreeMap<SettingId, Value> = cleaned
            .iter()
            .filter_map(|id| store.get(id).map(|value| (id.clone(), value.clone())))
            .collect();

        let payload = SavedPayload {
            next_changeset_uuid: (self.changeset.uuid != saved_uuid).then(|| self.changeset.uuid.clone()),
            saved: saved.clone(),
        };
        let data = serde_json::to_value(&payload).unwrap_or(Value::Null);
        self.events.trigger(event::SAVED, &data);

        TransactionUpdate::Saved {
            report: SaveReport {
                status: request.status,
                saved_uuid,
                current_uuid: self.changeset.uuid.clone(),
                cleaned,
            },
            saved,
            invalid,
        }
    }

    fn receive_rejected(
        &mut self,
        pending: PendingSave,
        code: SaveErrorCode,
        link: &mut dyn ServerLink,
    ) -> TransactionUpdate {
        match code {
            SaveErrorCode::BadNonce if !pending.nonce_retried => {
                let id = self.keys.generate();
                debug!("save {} hit an expired token, refreshing with {}", pending.id, id);
                link.post(id, ServerRequest::RefreshNonces);
                self.refreshing_nonces = Some((id, pending));
                TransactionUpdate::RefreshingNonces
            }
            SaveErrorCode::InvalidTransactionUuid => {
                self.terminal = Some(code);
                self.queued = None;
                self.fail(TransactionError::Conflict {
                    uuid: pending.request.changeset_uuid,
                })
            }
            SaveErrorCode::Unauthorized => {
                self.terminal = Some(code);
                self.queued = None;
                self.fail(TransactionError::Unauthorized)
            }
            code => self.fail(TransactionError::Rejected { code }),
        }
    }

    fn receive_nonces(
        &mut self,
        result: Result<ServerResponse, RequestError>,
        link: &mut dyn ServerLink,
    ) -> TransactionUpdate {
        let Some((_, pending)) = self.refreshing_nonces.take() else {
            return TransactionUpdate::Stale;
        };

        let nonces = match result {
            Ok(ServerResponse::Nonces(nonces)) => nonces,
            Ok(other) => {
                return self.fail(TransactionError::NonceRefreshFailed {
                    reason: format!("unexpected {} response", response_kind(&other)),
                })
            }
            Err(err) => {
                return self.fail(TransactionError::NonceRefreshFailed {
                    reason: err.to_string(),
                })
            }
        };

        self.nonces.merge(&nonces);
        let mut request = pending.request;
        if request.changeset_uuid != self.changeset.uuid {
            warn!("dropping retry for superseded changeset {}", request.changeset_uuid);
            return TransactionUpdate::NoncesRefreshed(nonces);
        }
        request.nonce = self.nonces.get("save").unwrap_or_default().to_string();
        self.post(request, true, link);
        TransactionUpdate::NoncesRefreshed(nonces)
    }

    fn send_queued(&mut self, store: &SettingStore, link: &mut dyn ServerLink) {
        if self.is_saving() {
            return;
        }
        let Some(status) = self.queued.take() else {
            return;
        };
        match self.save(status, store, link) {
            Ok(outcome) => debug!("sent queued {:?} save: {:?}", status, outcome),
            Err(err) => warn!("queued {:?} save not sent: {}", status, err),
        }
    }

    fn fail(&mut self, error: TransactionError) -> TransactionUpdate {
        warn!("save failed: {}", error);
        self.events.trigger(SAVE_FAILED, &Value::String(error.to_string()));
        TransactionUpdate::Failed(error)
    }
}

impl Evented for TransactionController {
    fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }
}

fn stronger(queued: Option<ChangesetStatus>, status: ChangesetStatus) -> ChangesetStatus {
    fn rank(status: ChangesetStatus) -> u8 {
        match status {
            ChangesetStatus::Draft => 0,
            ChangesetStatus::Pending => 1,
            ChangesetStatus::Publish => 2,
        }
    }
    match queued {
        Some(queued) if rank(queued) >= rank(status) => queued,
        _ => status,
    }
}

pub(crate) fn response_kind(response: &ServerResponse) -> &'static str {
    match response {
        ServerResponse::Saved(_) => "save",
        ServerResponse::SaveRejected { .. } => "save rejection",
        ServerResponse::Nonces(_) => "nonces",
        ServerResponse::Partials(_) => "partials",
    }
}
