use url::Url;

use crate::types::{ChangesetUuid, ChannelId};

pub const CHANGESET_UUID_PARAM: &str = "customize_changeset_uuid";
pub const THEME_PARAM: &str = "customize_theme";
pub const CHANNEL_PARAM: &str = "customize_messenger_channel";

/// The query parameters that keep a preview request attached to the pending
/// changeset instead of the published site
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParams {
    pub changeset_uuid: ChangesetUuid,
    /// Stylesheet being previewed, when it is not the active theme
    pub theme: Option<String>,
    /// Messenger channel, when the preview lives in a sub-frame
    pub channel: Option<ChannelId>,
}

impl StateParams {
    pub fn new(changeset_uuid: ChangesetUuid) -> Self {
        Self {
            changeset_uuid,
            theme: None,
            channel: None,
        }
    }

    pub fn names() -> [&'static str; 3] {
        [CHANGESET_UUID_PARAM, THEME_PARAM, CHANNEL_PARAM]
    }

    pub fn is_state_param(name: &str) -> bool {
        Self::names().contains(&name)
    }

    /// Parameters to attach, in a stable order
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(CHANGESET_UUID_PARAM, self.changeset_uuid.to_string())];
        if let Some(theme) = &self.theme {
            pairs.push((THEME_PARAM, theme.clone()));
        }
        if let Some(channel) = &self.channel {
            pairs.push((CHANNEL_PARAM, channel.to_string()));
        }
        pairs
    }

    /// Replace any state parameters in `url` with the current ones, keeping
    /// every other query parameter in place.
    pub fn inject(&self, url: &mut Url) {
        let kept = foreign_pairs(url);
        let mut query = url.query_pairs_mut();
        query.clear();
        for (name, value) in &kept {
            query.append_pair(name, value);
        }
        for (name, value) in self.pairs() {
            query.append_pair(name, &value);
        }
    }

    /// Whether `url` already carries every parameter these params require
    pub fn is_present_in(&self, url: &Url) -> bool {
        let present: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        self.pairs()
            .iter()
            .all(|(name, _)| present.iter().any(|(present_name, _)| present_name == name))
    }
}

/// Copy of `url` without state parameters or fragment, used to compare
/// locations independently of which changeset they point at
pub fn strip_state_params(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);

    let kept = foreign_pairs(url);
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        let mut query = stripped.query_pairs_mut();
        query.clear();
        for (name, value) in &kept {
            query.append_pair(name, value);
        }
    }
    stripped
}

fn foreign_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(name, _)| !StateParams::is_state_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}
