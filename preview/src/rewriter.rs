use log::{trace, warn};
use url::Url;

use livesync_shared::{ChangesetUuid, Previewability, PreviewUrlPolicy, StateParams};

use crate::{
    document::{NodeId, PreviewDocument},
    error::PreviewError,
};

/// Marks links and forms that cannot be followed inside the preview
pub const UNPREVIEWABLE_CLASS: &str = "customize-unpreviewable";

/// Keeps every navigation leaving the preview attached to the pending
/// changeset.
///
/// Links get the state parameters in their query string, forms get them as
/// hidden inputs, and outgoing requests get them appended when they target
/// a previewable URL. Targets the policy rejects are marked instead.
#[derive(Clone, Debug)]
pub struct LinkRewriter {
    policy: PreviewUrlPolicy,
    params: StateParams,
    upgrade_https: bool,
}

impl LinkRewriter {
    pub fn new(policy: PreviewUrlPolicy, params: StateParams) -> Self {
        Self {
            policy,
            params,
            upgrade_https: false,
        }
    }

    /// Rewrite `http` links to `https`, used when the pane itself is served
    /// over https
    pub fn with_https_upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade_https = upgrade;
        self
    }

    pub fn policy(&self) -> &PreviewUrlPolicy {
        &self.policy
    }

    pub fn params(&self) -> &StateParams {
        &self.params
    }

    pub fn set_changeset_uuid(&mut self, uuid: ChangesetUuid) {
        self.params.changeset_uuid = uuid;
    }

    /// Rewrite every link and form in the document
    pub fn rewrite_all<D: PreviewDocument>(&self, document: &mut D) {
        self.rewrite_scope(document, None);
    }

    /// Rewrite links and forms in freshly inserted content
    pub fn content_inserted<D: PreviewDocument>(&self, document: &mut D, node: NodeId) {
        if document.contains(node) {
            self.rewrite_scope(document, Some(node));
        }
    }

    /// Attach state parameters to an outgoing request. Returns the URL to
    /// use, or `None` when the request must go out untouched.
    pub fn prepare_request(&self, raw: &str, base: &Url) -> Option<String> {
        match self.policy.check_relative(raw, base) {
            Previewability::Previewable => {}
            _ => return None,
        }
        let mut url = base.join(raw.trim()).ok()?;
        self.params.inject(&mut url);
        Some(url.into())
    }

    /// The document's location with current state parameters
    pub fn stamp_location<D: PreviewDocument>(&self, document: &mut D) {
        let Some(mut url) = parse_location(document) else {
            return;
        };
        self.params.inject(&mut url);
        let stamped: String = url.into();
        if stamped != document.location() {
            document.replace_location(&stamped);
        }
    }

    fn rewrite_scope<D: PreviewDocument>(&self, document: &mut D, scope: Option<NodeId>) {
        let Some(base) = parse_location(document) else {
            return;
        };
        for link in document.links(scope) {
            self.rewrite_link(document, link, &base);
        }
        for form in document.forms(scope) {
            self.rewrite_form(document, form, &base);
        }
    }

    fn rewrite_link<D: PreviewDocument>(&self, document: &mut D, link: NodeId, base: &Url) {
        let Some(href) = document.attribute(link, "href") else {
            return;
        };
        // same-page anchors never leave the document
        if href.starts_with('#') {
            return;
        }

        match self.policy.check_relative(&href, base) {
            Previewability::Script => {
                document.set_class(link, UNPREVIEWABLE_CLASS, false);
            }
            Previewability::NotPreviewable(reason) => {
                trace!("link {:?} not previewable: {}", href, reason.describe());
                document.set_class(link, UNPREVIEWABLE_CLASS, true);
            }
            Previewability::Previewable => {
                document.set_class(link, UNPREVIEWABLE_CLASS, false);
                let Ok(mut url) = base.join(href.trim()) else {
                    return;
                };
                if self.upgrade_https && url.scheme() == "http" {
                    // only fails for special/non-special scheme swaps
                    let _ = url.set_scheme("https");
                }
                self.params.inject(&mut url);
                document.set_attribute(link, "href", url.as_str());
                if self.params.channel.is_some() {
                    document.set_attribute(link, "target", "_self");
                }
            }
        }
    }

    fn rewrite_form<D: PreviewDocument>(&self, document: &mut D, form: NodeId, base: &Url) {
        let action = document
            .attribute(form, "action")
            .filter(|action| !action.trim().is_empty())
            .unwrap_or_else(|| base.as_str().to_string());

        if !self.policy.check_relative(&action, base).is_previewable() {
            document.set_class(form, UNPREVIEWABLE_CLASS, true);
            return;
        }
        document.set_class(form, UNPREVIEWABLE_CLASS, false);
        if self.params.channel.is_some() {
            document.set_attribute(form, "target", "_self");
        }
        for (name, value) in self.params.pairs() {
            if document.hidden_input(form, name).as_deref() != Some(value.as_str()) {
                document.set_hidden_input(form, name, &value);
            }
        }
    }
}

/// The document's location as a URL
pub(crate) fn location_url<D: PreviewDocument>(document: &D) -> Result<Url, PreviewError> {
    let location = document.location();
    Url::parse(&location).map_err(|err| PreviewError::InvalidLocation {
        url: location,
        reason: err.to_string(),
    })
}

pub(crate) fn parse_location<D: PreviewDocument>(document: &D) -> Option<Url> {
    location_url(document)
        .map_err(|err| warn!("{}", err))
        .ok()
}
