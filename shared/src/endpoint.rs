//! Contract with the server: the requests this engine issues, and the
//! answers it understands.
//!
//! The engine never performs I/O itself. Requests go out through a
//! `ServerLink`, tagged with a `RequestId`, and the host feeds the outcome
//! back with the same id once it has it.

use crate::key_generator::RequestId;

pub mod error;
pub mod request;
pub mod response;

pub use error::{RequestError, SaveErrorCode};
pub use request::{PartialsRequest, PlacementContext, SaveRequest, ServerRequest};
pub use response::{PartialError, PartialsResponse, SaveResponse, ServerResponse};

/// Outbound half of the server connection
pub trait ServerLink {
    fn post(&mut self, id: RequestId, request: ServerRequest);
}

/// What the host hands back for a request
pub type ServerResult = Result<ServerResponse, RequestError>;
