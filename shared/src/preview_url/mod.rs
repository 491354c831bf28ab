pub mod error;
pub mod policy;
pub mod state_params;
