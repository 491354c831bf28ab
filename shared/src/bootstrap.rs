use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    changeset::Changeset,
    preview_url::state_params::StateParams,
    protocol::payload::{ActiveMap, Nonces},
    settings::{setting::Transport, store::SettingStore},
    types::{ChannelId, PartialId, SettingId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("Malformed bootstrap payload: {reason}")]
    Malformed { reason: String },
}

/// Theme being previewed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeInfo {
    pub stylesheet: String,
    /// Whether `stylesheet` is already the live theme
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapUrls {
    /// URL of the window this payload was rendered into
    #[serde(rename = "self", default)]
    pub self_url: String,
}

/// Selective-refresh declaration of one partial
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDeclaration {
    pub selector: String,
    #[serde(default)]
    pub settings: Vec<SettingId>,
    #[serde(default)]
    pub container_inclusive: bool,
    #[serde(default = "default_true")]
    pub fallback_refresh: bool,
}

/// Everything a window needs at startup, read once
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    #[serde(alias = "transaction")]
    pub changeset: Changeset,
    #[serde(default)]
    pub theme: Option<ThemeInfo>,
    #[serde(default)]
    pub url: BootstrapUrls,
    #[serde(default)]
    pub nonce: Nonces,
    #[serde(default)]
    pub settings_values: BTreeMap<SettingId, Value>,
    #[serde(default)]
    pub settings_transports: BTreeMap<SettingId, Transport>,
    #[serde(default)]
    pub dirty_ids: Vec<SettingId>,
    #[serde(default)]
    pub active_panels: ActiveMap,
    #[serde(default)]
    pub active_sections: ActiveMap,
    #[serde(default)]
    pub active_controls: ActiveMap,
    #[serde(default)]
    pub allowed_urls: Vec<String>,
    #[serde(default)]
    pub channel: Option<ChannelId>,
    #[serde(default)]
    pub partials: BTreeMap<PartialId, PartialDeclaration>,
}

impl Bootstrap {
    pub fn from_json(raw: &str) -> Result<Self, BootstrapError> {
        serde_json::from_str(raw).map_err(|err| BootstrapError::Malformed {
            reason: err.to_string(),
        })
    }

    /// Store holding the initial values, with `dirty_ids` already unsaved
    pub fn build_store(&self) -> SettingStore {
        let mut store = SettingStore::from_values(&self.settings_values, &self.settings_transports);
        for id in &self.dirty_ids {
            // dirty ids without a value are ignored
            let _ = store.mark_dirty(id);
        }
        store
    }

    pub fn state_params(&self) -> StateParams {
        let mut params = StateParams::new(self.changeset.uuid.clone());
        params.theme = self
            .theme
            .as_ref()
            .filter(|theme| !theme.active)
            .map(|theme| theme.stylesheet.clone());
        params.channel = self.channel.clone();
        params
    }
}

fn default_true() -> bool {
    true
}
