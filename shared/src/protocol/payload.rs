use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ChangesetUuid, PartialId, SettingId};

/// Which constructs are active on the previewed page, keyed by id
pub type ActiveMap = BTreeMap<String, bool>;

/// Body of the `setting` event: a bare `[id, value]` pair on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettingPayload(pub SettingId, pub Value);

/// Body of the `ready` event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub current_url: String,
    #[serde(default)]
    pub active_panels: ActiveMap,
    #[serde(default)]
    pub active_sections: ActiveMap,
    #[serde(default)]
    pub active_controls: ActiveMap,
}

/// Body of the `saved` event
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedPayload {
    /// Present only when the save published the changeset and a fresh one
    /// was opened for continued editing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_changeset_uuid: Option<ChangesetUuid>,
    /// Values the server persisted, keyed by setting id. Exactly these
    /// settings are no longer dirty.
    #[serde(default)]
    pub saved: BTreeMap<SettingId, Value>,
}

/// Body of the `partial-content-rendered` event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPayload {
    pub partials: Vec<PartialId>,
}

/// Auth tokens keyed by operation (`save`, `update`, `preview`, ...).
/// Treated as opaque strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonces(BTreeMap<String, String>);

impl Nonces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, operation: &str) -> Option<&str> {
        self.0.get(operation).map(String::as_str)
    }

    pub fn insert(&mut self, operation: &str, token: &str) {
        self.0.insert(operation.to_string(), token.to_string());
    }

    /// Take every token in `other`, keeping tokens `other` does not mention
    pub fn merge(&mut self, other: &Nonces) {
        for (operation, token) in &other.0 {
            self.0.insert(operation.clone(), token.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Nonces {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut nonces = Nonces::new();
        for (operation, token) in pairs {
            nonces.insert(operation, token);
        }
        nonces
    }
}
