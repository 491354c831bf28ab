use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::SettingId;

/// How a change to a setting reaches the preview
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// The preview must be reloaded to reflect a new value
    #[default]
    #[serde(rename = "refresh")]
    Refresh,
    /// The value is sent to the preview and applied in place
    #[serde(rename = "postMessage")]
    PostMessage,
}

/// One named value plus the value last known to be persisted
#[derive(Clone, Debug, PartialEq)]
pub struct Setting {
    id: SettingId,
    value: Value,
    saved: Option<Value>,
    transport: Transport,
}

impl Setting {
    pub(crate) fn new(id: SettingId, value: Value, dirty: bool, transport: Transport) -> Self {
        let saved = if dirty { None } else { Some(value.clone()) };
        Self {
            id,
            value,
            saved,
            transport,
        }
    }

    pub fn id(&self) -> &SettingId {
        &self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn saved_value(&self) -> Option<&Value> {
        self.saved.as_ref()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Dirty means the current value differs from the last persisted one. A
    /// setting that has never been persisted is always dirty.
    pub fn is_dirty(&self) -> bool {
        self.saved.as_ref() != Some(&self.value)
    }

    pub(crate) fn replace_value(&mut self, value: Value) -> Value {
        std::mem::replace(&mut self.value, value)
    }

    pub(crate) fn set_saved(&mut self, value: Option<Value>) {
        self.saved = value;
    }

    pub(crate) fn set_transport(&mut self, transport: Transport) {
        self.transport = transport;
    }
}

/// Options for `SettingStore::create`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Create the setting as not yet persisted, so it is included in the
    /// next save
    pub dirty: bool,
    pub transport: Transport,
}

impl CreateOptions {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }
}

/// Emitted for every change that makes it into the store
#[derive(Clone, Debug, PartialEq)]
pub struct SettingChange {
    pub id: SettingId,
    pub value: Value,
    /// `None` when the change created the setting
    pub previous: Option<Value>,
}
