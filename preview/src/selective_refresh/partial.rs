use livesync_shared::{PartialDeclaration, PartialId, SettingId};

/// A region of the document that can be re-rendered on its own
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partial {
    pub id: PartialId,
    /// Locates every placement of this partial
    pub selector: String,
    pub settings: Vec<SettingId>,
    /// Replace the matched element itself rather than its children
    pub container_inclusive: bool,
    /// Reload the whole preview when this partial cannot be rendered
    pub fallback_refresh: bool,
}

impl Partial {
    pub fn new(id: &str, selector: &str, settings: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            selector: selector.to_string(),
            settings: settings.iter().map(|setting| setting.to_string()).collect(),
            container_inclusive: false,
            fallback_refresh: true,
        }
    }

    pub fn from_declaration(id: &str, declaration: &PartialDeclaration) -> Self {
        Self {
            id: id.to_string(),
            selector: declaration.selector.clone(),
            settings: declaration.settings.clone(),
            container_inclusive: declaration.container_inclusive,
            fallback_refresh: declaration.fallback_refresh,
        }
    }

    pub fn with_container_inclusive(mut self, inclusive: bool) -> Self {
        self.container_inclusive = inclusive;
        self
    }

    pub fn with_fallback_refresh(mut self, fallback: bool) -> Self {
        self.fallback_refresh = fallback;
        self
    }

    pub fn is_bound_to(&self, setting: &str) -> bool {
        self.settings.iter().any(|id| id == setting)
    }
}
