use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod error;
pub mod event;
pub mod payload;

pub use error::ProtocolError;

/// Decode the data of a received event into its typed payload
pub fn decode<T: DeserializeOwned>(event: &str, data: &Value) -> Result<T, ProtocolError> {
    T::deserialize(data).map_err(|err| ProtocolError::MalformedPayload {
        event: event.to_string(),
        reason: err.to_string(),
    })
}
