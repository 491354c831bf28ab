pub mod envelope;
pub mod error;
pub mod messenger;
pub mod port;
