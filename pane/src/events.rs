use std::{mem, vec::IntoIter};

use livesync_shared::{ChangesetStatus, ChangesetUuid, ChannelId, ReadyPayload, SettingId};

use crate::error::TransactionError;

/// Problems the user has to hear about
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionNotice {
    /// A save failed for good. Unsaved edits are still in the store.
    SaveFailed(TransactionError),
    /// The server refused one setting; other settings in the same save
    /// went through
    InvalidSetting { id: SettingId, message: String },
    /// A preview stopped answering
    PreviewLost { channel: Option<ChannelId> },
}

/// A save the server accepted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub status: ChangesetStatus,
    /// Uuid the save was made against
    pub saved_uuid: ChangesetUuid,
    /// Uuid to keep editing under; differs from `saved_uuid` after a publish
    pub current_uuid: ChangesetUuid,
    /// Settings that are clean now
    pub cleaned: Vec<SettingId>,
}

pub struct PaneEvents {
    ready: Vec<(Option<ChannelId>, ReadyPayload)>,
    saves: Vec<SaveReport>,
    notices: Vec<SessionNotice>,
    reloads: Vec<Option<ChannelId>>,
    titles: Vec<(Option<ChannelId>, String)>,
    empty: bool,
}

impl Default for PaneEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneEvents {
    pub(crate) fn new() -> Self {
        Self {
            ready: Vec::new(),
            saves: Vec::new(),
            notices: Vec::new(),
            reloads: Vec::new(),
            titles: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: PaneEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: PaneEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_ready(&mut self, channel: Option<ChannelId>, payload: ReadyPayload) {
        self.ready.push((channel, payload));
        self.empty = false;
    }

    pub(crate) fn push_save(&mut self, report: SaveReport) {
        self.saves.push(report);
        self.empty = false;
    }

    pub(crate) fn push_notice(&mut self, notice: SessionNotice) {
        self.notices.push(notice);
        self.empty = false;
    }

    pub(crate) fn push_reload(&mut self, channel: Option<ChannelId>) {
        self.reloads.push(channel);
        self.empty = false;
    }

    pub(crate) fn push_title(&mut self, channel: Option<ChannelId>, title: String) {
        self.titles.push((channel, title));
        self.empty = false;
    }
}

// Event Trait
pub trait PaneEvent {
    type Iter;

    fn iter(events: &mut PaneEvents) -> Self::Iter;

    fn has(events: &PaneEvents) -> bool;
}

// PreviewReadyEvent
pub struct PreviewReadyEvent;
impl PaneEvent for PreviewReadyEvent {
    type Iter = IntoIter<(Option<ChannelId>, ReadyPayload)>;

    fn iter(events: &mut PaneEvents) -> Self::Iter {
        let list = mem::take(&mut events.ready);
        IntoIterator::into_iter(list)
    }

    fn has(events: &PaneEvents) -> bool {
        !events.ready.is_empty()
    }
}

// SavedEvent
pub struct SavedEvent;
impl PaneEvent for SavedEvent {
    type Iter = IntoIter<SaveReport>;

    fn iter(events: &mut PaneEvents) -> Self::Iter {
        let list = mem::take(&mut events.saves);
        IntoIterator::into_iter(list)
    }

    fn has(events: &PaneEvents) -> bool {
        !events.saves.is_empty()
    }
}

// NoticeEvent
pub struct NoticeEvent;
impl PaneEvent for NoticeEvent {
    type Iter = IntoIter<SessionNotice>;

    fn iter(events: &mut PaneEvents) -> Self::Iter {
        let list = mem::take(&mut events.notices);
        IntoIterator::into_iter(list)
    }

    fn has(events: &PaneEvents) -> bool {
        !events.notices.is_empty()
    }
}

// ReloadEvent: the host must reload the preview on this channel
pub struct ReloadEvent;
impl PaneEvent for ReloadEvent {
    type Iter = IntoIter<Option<ChannelId>>;

    fn iter(events: &mut PaneEvents) -> Self::Iter {
        let list = mem::take(&mut events.reloads);
        IntoIterator::into_iter(list)
    }

    fn has(events: &PaneEvents) -> bool {
        !events.reloads.is_empty()
    }
}

// TitleEvent
pub struct TitleEvent;
impl PaneEvent for TitleEvent {
    type Iter = IntoIter<(Option<ChannelId>, String)>;

    fn iter(events: &mut PaneEvents) -> Self::Iter {
        let list = mem::take(&mut events.titles);
        IntoIterator::into_iter(list)
    }

    fn has(events: &PaneEvents) -> bool {
        !events.titles.is_empty()
    }
}
