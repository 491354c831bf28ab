use serde::{Deserialize, Serialize};

use crate::types::ChangesetUuid;

/// Lifecycle of a changeset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangesetStatus {
    /// Staged, visible only inside previews
    #[default]
    Draft,
    /// Staged and waiting for someone allowed to publish
    Pending,
    /// Applied to the live site
    Publish,
}

impl ChangesetStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, ChangesetStatus::Publish)
    }
}

/// The batch of pending values currently being edited
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    pub uuid: ChangesetUuid,
    #[serde(default)]
    pub status: ChangesetStatus,
}

impl Changeset {
    pub fn new(uuid: ChangesetUuid) -> Self {
        Self {
            uuid,
            status: ChangesetStatus::Draft,
        }
    }
}
