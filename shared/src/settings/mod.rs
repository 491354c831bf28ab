pub mod error;
pub mod setting;
pub mod store;
