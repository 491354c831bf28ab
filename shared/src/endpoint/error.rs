use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error codes the save endpoint answers with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum SaveErrorCode {
    /// The auth token expired or is invalid
    #[error("bad_nonce")]
    BadNonce,
    #[error("bad_method")]
    BadMethod,
    /// The user may not make this change
    #[error("unauthorized")]
    Unauthorized,
    /// The changeset was changed or published elsewhere
    #[error("invalid_transaction_uuid")]
    InvalidTransactionUuid,
    #[error("missing_payload")]
    MissingPayload,
    #[error("not_preview")]
    NotPreview,
    /// Anything else, usually a setting-specific validation failure
    #[error("{0}")]
    Other(String),
}

impl SaveErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "bad_nonce" => Self::BadNonce,
            "bad_method" => Self::BadMethod,
            "unauthorized" => Self::Unauthorized,
            "invalid_transaction_uuid" | "invalid_changeset_uuid" => Self::InvalidTransactionUuid,
            "missing_payload" => Self::MissingPayload,
            "not_preview" => Self::NotPreview,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::BadNonce => "bad_nonce",
            Self::BadMethod => "bad_method",
            Self::Unauthorized => "unauthorized",
            Self::InvalidTransactionUuid => "invalid_transaction_uuid",
            Self::MissingPayload => "missing_payload",
            Self::NotPreview => "not_preview",
            Self::Other(code) => code,
        }
    }

    /// Terminal codes invalidate the editing session, retrying is pointless
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::InvalidTransactionUuid)
    }
}

impl Serialize for SaveErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SaveErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::parse(&code))
    }
}

/// Failure of a server round trip before any answer could be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Network failure: {reason}")]
    Network { reason: String },
    #[error("Malformed response: {reason}")]
    Malformed { reason: String },
    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },
}

impl RequestError {
    pub fn network(reason: impl fmt::Display) -> Self {
        Self::Network {
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl fmt::Display) -> Self {
        Self::Malformed {
            reason: reason.to_string(),
        }
    }
}
