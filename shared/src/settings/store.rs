use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use crate::{
    settings::{
        error::SettingError,
        setting::{CreateOptions, Setting, SettingChange, Transport},
    },
    types::SettingId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverKey(u64);

type Callback = Box<dyn FnMut(&SettingChange)>;

struct Observer {
    key: ObserverKey,
    setting: Option<SettingId>,
    callback: Callback,
}

/// Authoritative in-memory map of setting id to value, one per window.
///
/// `set` and `create` are the only write paths. Both notify observers
/// synchronously and append the change to a queue the owning component drains
/// with `drain_changes`, so local edits and values arriving from the other
/// window look the same once they are in the store.
#[derive(Default)]
pub struct SettingStore {
    settings: BTreeMap<SettingId, Setting>,
    observers: Vec<Observer>,
    next_observer: u64,
    changes: Vec<SettingChange>,
}

impl SettingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store of clean settings, e.g. from a bootstrap payload
    pub fn from_values(
        values: &BTreeMap<SettingId, Value>,
        transports: &BTreeMap<SettingId, Transport>,
    ) -> Self {
        let mut store = Self::new();
        for (id, value) in values {
            let transport = transports.get(id).copied().unwrap_or_default();
            store
                .settings
                .insert(id.clone(), Setting::new(id.clone(), value.clone(), false, transport));
        }
        store
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.settings.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.settings.get(id).map(Setting::value)
    }

    pub fn setting(&self, id: &str) -> Option<&Setting> {
        self.settings.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.values()
    }

    pub fn transport(&self, id: &str) -> Option<Transport> {
        self.settings.get(id).map(Setting::transport)
    }

    pub fn set_transport(&mut self, id: &str, transport: Transport) -> Result<(), SettingError> {
        let setting = self.settings.get_mut(id).ok_or_else(|| unknown(id))?;
        setting.set_transport(transport);
        Ok(())
    }

    /// Update a value. Returns whether anything changed; setting a value equal
    /// to the current one is a no-op and notifies nobody.
    pub fn set(&mut self, id: &str, value: Value) -> Result<bool, SettingError> {
        let setting = self.settings.get_mut(id).ok_or_else(|| unknown(id))?;
        if *setting.value() == value {
            return Ok(false);
        }
        let previous = setting.replace_value(value.clone());
        self.notify(SettingChange {
            id: id.to_string(),
            value,
            previous: Some(previous),
        });
        Ok(true)
    }

    /// Register an id the store has not seen before
    pub fn create(&mut self, id: &str, value: Value, options: CreateOptions) -> Result<(), SettingError> {
        if self.settings.contains_key(id) {
            return Err(SettingError::AlreadyExists { id: id.to_string() });
        }
        debug!("creating setting {:?} (dirty: {})", id, options.dirty);
        self.settings.insert(
            id.to_string(),
            Setting::new(id.to_string(), value.clone(), options.dirty, options.transport),
        );
        self.notify(SettingChange {
            id: id.to_string(),
            value,
            previous: None,
        });
        Ok(())
    }

    /// Set an existing setting, or create it if unknown. Returns whether the
    /// store changed.
    pub fn set_or_create(&mut self, id: &str, value: Value, create_dirty: bool) -> bool {
        if self.contains(id) {
            return self.set(id, value).unwrap_or(false);
        }
        let options = CreateOptions {
            dirty: create_dirty,
            ..CreateOptions::default()
        };
        self.create(id, value, options).is_ok()
    }

    /// Flag a setting as unsaved without changing its value
    pub fn mark_dirty(&mut self, id: &str) -> Result<(), SettingError> {
        let setting = self.settings.get_mut(id).ok_or_else(|| unknown(id))?;
        setting.set_saved(None);
        Ok(())
    }

    pub fn is_dirty(&self, id: &str) -> bool {
        self.settings.get(id).is_some_and(Setting::is_dirty)
    }

    pub fn dirty_ids(&self) -> Vec<SettingId> {
        self.settings
            .values()
            .filter(|setting| setting.is_dirty())
            .map(|setting| setting.id().clone())
            .collect()
    }

    pub fn dirty_values(&self) -> BTreeMap<SettingId, Value> {
        self.settings
            .values()
            .filter(|setting| setting.is_dirty())
            .map(|setting| (setting.id().clone(), setting.value().clone()))
            .collect()
    }

    pub fn values(&self) -> BTreeMap<SettingId, Value> {
        self.settings
            .iter()
            .map(|(id, setting)| (id.clone(), setting.value().clone()))
            .collect()
    }

    /// Record a successful save.
    ///
    /// `sent` is exactly the payload that was persisted, `sanitized` whatever
    /// the server reports it actually stored. Only ids in `sent` are touched.
    /// A setting still holding the value that was sent adopts the server's
    /// value; one edited while the save was in flight keeps its newer value
    /// and stays dirty. Returns the ids that are now clean.
    pub fn reconcile_saved(
        &mut self,
        sent: &BTreeMap<SettingId, Value>,
        sanitized: &BTreeMap<SettingId, Value>,
    ) -> Vec<SettingId> {
        let mut cleaned = Vec::new();

        for (id, sent_value) in sent {
            let persisted = sanitized.get(id).unwrap_or(sent_value).clone();
            let Some(setting) = self.settings.get_mut(id) else {
                continue;
            };

            let untouched = setting.value() == sent_value;
            setting.set_saved(Some(persisted.clone()));

            if untouched && *setting.value() != persisted {
                let previous = setting.replace_value(persisted.clone());
                self.notify(SettingChange {
                    id: id.clone(),
                    value: persisted,
                    previous: Some(previous),
                });
            }

            if self.is_dirty(id) {
                debug!("setting {:?} was edited during save, still dirty", id);
            } else {
                cleaned.push(id.clone());
            }
        }

        cleaned
    }

    /// Adopt `values` as the persisted baseline without changing any current
    /// value. Ids outside `values` keep their dirty state.
    pub fn mark_saved(&mut self, values: &BTreeMap<SettingId, Value>) {
        for (id, value) in values {
            if let Some(setting) = self.settings.get_mut(id) {
                setting.set_saved(Some(value.clone()));
            }
        }
    }

    /// Observe changes to one setting
    pub fn bind<F>(&mut self, id: &str, callback: F) -> ObserverKey
    where
        F: FnMut(&SettingChange) + 'static,
    {
        self.add_observer(Some(id.to_string()), Box::new(callback))
    }

    /// Observe changes to every setting
    pub fn bind_all<F>(&mut self, callback: F) -> ObserverKey
    where
        F: FnMut(&SettingChange) + 'static,
    {
        self.add_observer(None, Box::new(callback))
    }

    pub fn unbind(&mut self, key: ObserverKey) -> bool {
        let before = self.observers.len();
        self.observers.retain(|observer| observer.key != key);
        self.observers.len() != before
    }

    /// Whether something is observing this specific setting
    pub fn has_observers(&self, id: &str) -> bool {
        self.observers
            .iter()
            .any(|observer| observer.setting.as_deref() == Some(id))
    }

    /// Take every change recorded since the last drain, oldest first
    pub fn drain_changes(&mut self) -> Vec<SettingChange> {
        std::mem::take(&mut self.changes)
    }

    fn add_observer(&mut self, setting: Option<SettingId>, callback: Callback) -> ObserverKey {
        let key = ObserverKey(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Observer {
            key,
            setting,
            callback,
        });
        key
    }

    fn notify(&mut self, change: SettingChange) {
        for observer in self.observers.iter_mut() {
            let interested = match &observer.setting {
                Some(id) => *id == change.id,
                None => true,
            };
            if interested {
                (observer.callback)(&change);
            }
        }
        self.changes.push(change);
    }
}

fn unknown(id: &str) -> SettingError {
    SettingError::UnknownSetting { id: id.to_string() }
}
