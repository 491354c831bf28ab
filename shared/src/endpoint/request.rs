use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    changeset::ChangesetStatus,
    types::{ChangesetUuid, PartialId, SettingId},
};

/// Body of a save/publish request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub changeset_uuid: ChangesetUuid,
    pub status: ChangesetStatus,
    pub settings: BTreeMap<SettingId, Value>,
    pub nonce: String,
}

/// Rendering context of one placement
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementContext {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

/// Body of a selective-refresh request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartialsRequest {
    pub changeset_uuid: ChangesetUuid,
    pub nonce: String,
    /// Every dirty value known to the preview, so the server renders with
    /// the pending state
    pub customized: BTreeMap<SettingId, Value>,
    /// One context per placement, in document order
    pub partials: BTreeMap<PartialId, Vec<PlacementContext>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerRequest {
    Save(SaveRequest),
    RefreshNonces,
    RenderPartials(PartialsRequest),
}

impl ServerRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ServerRequest::Save(_) => "save",
            ServerRequest::RefreshNonces => "refresh_nonces",
            ServerRequest::RenderPartials(_) => "render_partials",
        }
    }
}
