pub mod engine;
pub mod partial;
pub mod placement;
