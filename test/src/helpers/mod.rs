pub mod mock_server;
pub mod session;

pub use bootstrap::{fresh_uuid, sample_bootstrap, sample_document, CHANNEL};
pub use mock_server::{rendered, saved, MockServer};
pub use session::Session;
