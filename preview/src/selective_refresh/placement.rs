use serde_json::Value;

use livesync_shared::{PartialId, PlacementContext};

use crate::{
    document::{NodeId, PreviewDocument},
    selective_refresh::partial::Partial,
};

/// Attribute holding a JSON context for one placement, e.g. which instance
/// of a repeated widget it renders
pub const CONTEXT_ATTRIBUTE: &str = "data-customize-partial-placement-context";

/// One on-page occurrence of a partial
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub partial: PartialId,
    pub container: NodeId,
    pub context: Value,
}

impl Placement {
    pub fn request_context(&self) -> PlacementContext {
        PlacementContext {
            context: self.context.clone(),
        }
    }
}

/// Every placement of `partial` currently in the document, in document order
pub fn find_placements<D: PreviewDocument>(document: &D, partial: &Partial) -> Vec<Placement> {
    document
        .select(&partial.selector)
        .into_iter()
        .map(|container| Placement {
            partial: partial.id.clone(),
            container,
            context: document
                .attribute(container, CONTEXT_ATTRIBUTE)
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or(Value::Null),
        })
        .collect()
}
