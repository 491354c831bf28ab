/// Server stand-in for E2E testing
/// Records every request posted through it; tests answer them by hand

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use serde_json::Value;

use livesync_shared::{
    ChangesetUuid, PartialsRequest, PartialsResponse, RequestId, SaveRequest, SaveResponse,
    ServerLink, ServerRequest, ServerResponse,
};

/// Clones share one request log, so a test can keep a handle while the
/// component under test owns the link
#[derive(Clone, Default)]
pub struct MockServer {
    requests: Rc<RefCell<VecDeque<(RequestId, ServerRequest)>>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self) -> Box<dyn ServerLink> {
        Box::new(self.clone())
    }

    pub fn pending(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn take(&self) -> Vec<(RequestId, ServerRequest)> {
        self.requests.borrow_mut().drain(..).collect()
    }

    /// Remove and return the oldest save request
    pub fn next_save(&self) -> Option<(RequestId, SaveRequest)> {
        self.take_first(|request| match request {
            ServerRequest::Save(save) => Some(save.clone()),
            _ => None,
        })
    }

    /// Remove and return the oldest render request
    pub fn next_render(&self) -> Option<(RequestId, PartialsRequest)> {
        self.take_first(|request| match request {
            ServerRequest::RenderPartials(render) => Some(render.clone()),
            _ => None,
        })
    }

    pub fn next_nonce_refresh(&self) -> Option<RequestId> {
        self.take_first(|request| match request {
            ServerRequest::RefreshNonces => Some(()),
            _ => None,
        })
        .map(|(id, _)| id)
    }

    fn take_first<T>(&self, pick: impl Fn(&ServerRequest) -> Option<T>) -> Option<(RequestId, T)> {
        let mut requests = self.requests.borrow_mut();
        let index = requests
            .iter()
            .position(|(_, request)| pick(request).is_some())?;
        let (id, request) = requests.remove(index)?;
        pick(&request).map(|picked| (id, picked))
    }
}

impl ServerLink for MockServer {
    fn post(&mut self, id: RequestId, request: ServerRequest) {
        self.requests.borrow_mut().push_back((id, request));
    }
}

/// A successful save under `uuid`, reporting `sanitized` as stored
pub fn saved(uuid: &str, sanitized: &[(&str, Value)]) -> ServerResponse {
    ServerResponse::Saved(SaveResponse {
        changeset_uuid: ChangesetUuid::new(uuid),
        sanitized_settings: sanitized
            .iter()
            .map(|(id, value)| (id.to_string(), value.clone()))
            .collect(),
        ..SaveResponse::default()
    })
}

/// A render response for one partial, one fragment per placement
pub fn rendered(partial: &str, fragments: &[&str]) -> ServerResponse {
    let mut contents = BTreeMap::new();
    contents.insert(
        partial.to_string(),
        fragments.iter().map(|html| Some(html.to_string())).collect(),
    );
    ServerResponse::Partials(PartialsResponse {
        contents,
        errors: Vec::new(),
    })
}
