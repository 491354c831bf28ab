use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use log::{debug, trace, warn};
use serde_json::Value;

use livesync_shared::{
    Backoff, BackoffConfig, ChangesetUuid, Debouncer, Instant, KeyGenerator, PartialId,
    PartialsRequest, PartialsResponse, RequestError, RequestId, ServerLink, ServerRequest,
    ServerResponse, SettingId,
};

use crate::{
    document::{NodeId, PreviewDocument},
    error::PreviewError,
    selective_refresh::{
        partial::Partial,
        placement::{find_placements, Placement},
    },
};

/// Set on placements while a refresh for them is pending
pub const REFRESHING_CLASS: &str = "customize-partial-refreshing";

/// State a render request is made against
#[derive(Clone, Debug, PartialEq)]
pub struct RenderContext {
    pub changeset_uuid: ChangesetUuid,
    pub nonce: String,
    /// Every unsaved value the preview holds
    pub customized: BTreeMap<SettingId, Value>,
}

/// What applying a response did to the document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Partials whose new content is now in the document
    pub rendered: Vec<PartialId>,
    /// Roots of inserted content, which still need links rewritten
    pub inserted: Vec<NodeId>,
    /// A partial could not be rendered and wants the whole preview reloaded
    pub full_reload: bool,
}

struct Target {
    partial: PartialId,
    generation: u64,
    placements: Vec<Placement>,
}

struct Flight {
    request: PartialsRequest,
    targets: Vec<Target>,
    backoff: Backoff,
}

/// Re-renders partials through the server instead of reloading the page.
///
/// Every scheduled refresh bumps the partial's generation. Requests carry
/// the generation they were built for and a response is only applied to
/// partials whose generation has not moved since, so the most recently
/// scheduled refresh wins no matter in which order responses arrive.
pub struct SelectiveRefresh {
    partials: BTreeMap<PartialId, Partial>,
    generations: BTreeMap<PartialId, u64>,
    pending: BTreeSet<PartialId>,
    buffer: Debouncer,
    in_flight: BTreeMap<RequestId, Flight>,
    retrying: Vec<(Instant, Flight)>,
    keys: KeyGenerator,
    retry: BackoffConfig,
    changeset_uuid: Option<ChangesetUuid>,
}

impl SelectiveRefresh {
    pub fn new(refresh_buffer: Duration, retry: BackoffConfig) -> Self {
        Self {
            partials: BTreeMap::new(),
            generations: BTreeMap::new(),
            pending: BTreeSet::new(),
            buffer: Debouncer::new(refresh_buffer),
            in_flight: BTreeMap::new(),
            retrying: Vec::new(),
            keys: KeyGenerator::new(),
            retry,
            changeset_uuid: None,
        }
    }

    pub fn add_partial(&mut self, partial: Partial) {
        debug!("registered partial {:?} ({})", partial.id, partial.selector);
        self.partials.insert(partial.id.clone(), partial);
    }

    pub fn partial(&self, id: &str) -> Option<&Partial> {
        self.partials.get(id)
    }

    pub fn partials_for_setting(&self, setting: &str) -> Vec<PartialId> {
        self.partials
            .values()
            .filter(|partial| partial.is_bound_to(setting))
            .map(|partial| partial.id.clone())
            .collect()
    }

    /// Latest scheduled generation of a partial
    pub fn generation(&self, id: &str) -> u64 {
        self.generations.get(id).copied().unwrap_or(0)
    }

    /// Whether anything is scheduled, in flight or waiting to be retried
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty() || !self.in_flight.is_empty() || !self.retrying.is_empty()
    }

    /// The changeset renders are requested against. Retries waiting for a
    /// previous changeset are dropped and their partials scheduled again, and
    /// responses to requests made under it are discarded from now on.
    pub fn set_changeset_uuid<D: PreviewDocument>(
        &mut self,
        uuid: ChangesetUuid,
        document: &mut D,
        now: Instant,
    ) {
        if self.changeset_uuid.as_ref() == Some(&uuid) {
            return;
        }
        self.changeset_uuid = Some(uuid);

        let (stale, current): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retrying)
            .into_iter()
            .partition(|(_, flight)| self.is_stale(flight));
        self.retrying = current;
        for (_, flight) in stale {
            debug!(
                "dropping retry made under changeset {}",
                flight.request.changeset_uuid
            );
            self.reschedule(&flight, document, now);
        }
    }

    /// Schedule every partial bound to `setting`. Returns how many were
    /// scheduled; zero means nothing can render this setting in place.
    pub fn schedule_setting<D: PreviewDocument>(
        &mut self,
        setting: &str,
        document: &mut D,
        now: Instant,
    ) -> usize {
        let ids = self.partials_for_setting(setting);
        for id in &ids {
            self.schedule(id, document, now);
        }
        ids.len()
    }

    pub fn request_partial<D: PreviewDocument>(
        &mut self,
        id: &str,
        document: &mut D,
        now: Instant,
    ) -> Result<(), PreviewError> {
        if !self.partials.contains_key(id) {
            return Err(PreviewError::UnknownPartial { id: id.to_string() });
        }
        self.schedule(id, document, now);
        Ok(())
    }

    /// Send the batched request once the buffer window has passed, and any
    /// retries that are due. `context` is only built when a new request goes
    /// out.
    pub fn update<D, F>(
        &mut self,
        now: Instant,
        document: &D,
        link: &mut dyn ServerLink,
        context: F,
    ) where
        D: PreviewDocument,
        F: FnOnce() -> RenderContext,
    {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retrying)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.retrying = waiting;
        for (_, flight) in due {
            self.send(flight, link);
        }

        if !self.buffer.poll(now) || self.pending.is_empty() {
            return;
        }

        let context = context();
        let mut targets = Vec::new();
        let mut partials = BTreeMap::new();
        for id in std::mem::take(&mut self.pending) {
            let Some(partial) = self.partials.get(&id) else {
                continue;
            };
            let placements = find_placements(document, partial);
            partials.insert(
                id.clone(),
                placements.iter().map(Placement::request_context).collect(),
            );
            targets.push(Target {
                generation: self.generation(&id),
                partial: id,
                placements,
            });
        }

        let flight = Flight {
            request: PartialsRequest {
                changeset_uuid: context.changeset_uuid,
                nonce: context.nonce,
                customized: context.customized,
                partials,
            },
            targets,
            backoff: Backoff::new(self.retry.clone()),
        };
        self.send(flight, link);
    }

    /// Apply the answer to a render request. Returns `None` when `id` is not
    /// one of this engine's requests.
    pub fn receive_response<D: PreviewDocument>(
        &mut self,
        id: RequestId,
        result: Result<ServerResponse, RequestError>,
        document: &mut D,
        now: Instant,
    ) -> Option<RefreshOutcome> {
        let mut flight = self.in_flight.remove(&id)?;
        let mut outcome = RefreshOutcome::default();

        if self.is_stale(&flight) {
            warn!(
                "discarding render {} made under changeset {}",
                id, flight.request.changeset_uuid
            );
            self.reschedule(&flight, document, now);
            return Some(outcome);
        }

        let response = match result {
            Ok(ServerResponse::Partials(response)) => response,
            Ok(_) => {
                warn!("render request {} answered with something else", id);
                self.fail_all(&flight.targets, document, &mut outcome);
                return Some(outcome);
            }
            Err(err) => {
                if let Some(delay) = flight.backoff.next_delay() {
                    warn!(
                        "render request {} failed ({}), retry {} in {:?}",
                        id,
                        err,
                        flight.backoff.attempts(),
                        delay
                    );
                    self.retrying.push((now + delay, flight));
                } else {
                    warn!("render request {} failed ({}), giving up", id, err);
                    self.fail_all(&flight.targets, document, &mut outcome);
                }
                return Some(outcome);
            }
        };

        for target in &flight.targets {
            if !self.is_current(target) {
                trace!(
                    "discarding superseded render of {:?} (generation {})",
                    target.partial,
                    target.generation
                );
                continue;
            }
            self.apply(target, &response, document, &mut outcome);
        }
        Some(outcome)
    }

    fn schedule<D: PreviewDocument>(&mut self, id: &str, document: &mut D, now: Instant) {
        let Some(partial) = self.partials.get(id) else {
            return;
        };
        for placement in find_placements(&*document, partial) {
            document.set_class(placement.container, REFRESHING_CLASS, true);
        }
        *self.generations.entry(id.to_string()).or_insert(0) += 1;
        self.pending.insert(id.to_string());
        self.buffer.schedule(now);
        debug!("scheduled refresh of {:?}", id);
    }

    /// Schedule again the partials of `flight` nothing newer has replaced
    fn reschedule<D: PreviewDocument>(&mut self, flight: &Flight, document: &mut D, now: Instant) {
        for target in &flight.targets {
            if self.is_current(target) {
                self.schedule(&target.partial, document, now);
            }
        }
    }

    fn is_stale(&self, flight: &Flight) -> bool {
        self.changeset_uuid
            .as_ref()
            .is_some_and(|uuid| *uuid != flight.request.changeset_uuid)
    }

    fn send(&mut self, flight: Flight, link: &mut dyn ServerLink) {
        let id = self.keys.generate();
        debug!(
            "requesting render {} of {:?}",
            id,
            flight.request.partials.keys().collect::<Vec<_>>()
        );
        link.post(id, ServerRequest::RenderPartials(flight.request.clone()));
        self.in_flight.insert(id, flight);
    }

    fn is_current(&self, target: &Target) -> bool {
        self.generation(&target.partial) == target.generation
    }

    fn apply<D: PreviewDocument>(
        &self,
        target: &Target,
        response: &PartialsResponse,
        document: &mut D,
        outcome: &mut RefreshOutcome,
    ) {
        let Some(partial) = self.partials.get(&target.partial) else {
            return;
        };

        let errors: Vec<_> = response.errors_for(&partial.id).collect();
        let fragments = response.contents.get(&partial.id);
        let usable = match fragments {
            Some(fragments) if errors.is_empty() => {
                fragments.len() == target.placements.len() && fragments.iter().all(Option::is_some)
            }
            _ => false,
        };
        if !usable {
            for error in &errors {
                warn!("partial {:?} failed to render: {}", partial.id, error.message);
            }
            self.fail(partial, target, document, outcome);
            return;
        }

        for (placement, html) in target.placements.iter().zip(fragments.into_iter().flatten()) {
            let Some(html) = html else {
                continue;
            };
            if !document.contains(placement.container) {
                continue;
            }
            if let Some(root) =
                document.replace_content(placement.container, html, partial.container_inclusive)
            {
                document.set_class(root, REFRESHING_CLASS, false);
                outcome.inserted.push(root);
            }
        }
        outcome.rendered.push(partial.id.clone());
    }

    fn fail_all<D: PreviewDocument>(
        &self,
        targets: &[Target],
        document: &mut D,
        outcome: &mut RefreshOutcome,
    ) {
        for target in targets {
            if !self.is_current(target) {
                continue;
            }
            if let Some(partial) = self.partials.get(&target.partial) {
                self.fail(partial, target, document, outcome);
            }
        }
    }

    fn fail<D: PreviewDocument>(
        &self,
        partial: &Partial,
        target: &Target,
        document: &mut D,
        outcome: &mut RefreshOutcome,
    ) {
        for placement in &target.placements {
            if document.contains(placement.container) {
                document.set_class(placement.container, REFRESHING_CLASS, false);
            }
        }
        if partial.fallback_refresh {
            debug!("partial {:?} falls back to a full reload", partial.id);
            outcome.full_reload = true;
        }
    }
}
