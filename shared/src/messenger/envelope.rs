use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ChannelId;

/// Wire format of every cross-window message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChannelId>,
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(id: Option<ChannelId>, event: &str, data: Value) -> Self {
        Self {
            id,
            event: event.to_string(),
            data,
        }
    }

    /// Parse a raw message, returning `None` for anything that is not an
    /// envelope. Other scripts share the window's message bus, so malformed
    /// input is expected and not an error.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// An envelope belongs to a channel when both carry the same id, or when
    /// neither carries one.
    pub fn matches_channel(&self, channel: Option<&ChannelId>) -> bool {
        self.id.as_ref() == channel
    }
}
