use thiserror::Error;

/// Errors that can occur during setting store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingError {
    /// Setting id has never been created in this store
    #[error("Setting {id:?} does not exist. Create it before setting a value")]
    UnknownSetting {
        id: String,
    },

    /// Setting id was created twice
    #[error("Setting {id:?} already exists and cannot be created again")]
    AlreadyExists {
        id: String,
    },
}
