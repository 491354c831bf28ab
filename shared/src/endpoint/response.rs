use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    endpoint::error::SaveErrorCode,
    protocol::payload::Nonces,
    types::{ChangesetUuid, PartialId, SettingId},
};

/// A save the server accepted
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    /// The uuid to keep editing under. Differs from the request's uuid only
    /// after a publish.
    pub changeset_uuid: ChangesetUuid,
    /// What the server actually stored, per setting
    #[serde(default)]
    pub sanitized_settings: BTreeMap<SettingId, Value>,
    /// Settings the server refused, with a message for each. These were not
    /// stored.
    #[serde(default)]
    pub setting_validities: BTreeMap<SettingId, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialError {
    #[serde(default)]
    pub partial: Option<PartialId>,
    pub message: String,
}

/// Rendered fragments, one per placement in request order. `None` means the
/// server chose not to render that placement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialsResponse {
    #[serde(default)]
    pub contents: BTreeMap<PartialId, Vec<Option<String>>>,
    #[serde(default)]
    pub errors: Vec<PartialError>,
}

impl PartialsResponse {
    /// Errors reported for `partial`, plus errors not attributed to any
    /// partial
    pub fn errors_for<'a>(&'a self, partial: &'a str) -> impl Iterator<Item = &'a PartialError> {
        self.errors
            .iter()
            .filter(move |error| error.partial.as_deref().map_or(true, |id| id == partial))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerResponse {
    Saved(SaveResponse),
    SaveRejected { code: SaveErrorCode },
    Nonces(Nonces),
    Partials(PartialsResponse),
}
