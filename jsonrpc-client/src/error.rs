use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::types::{ErrorObject, Id};

pub type Result<T, E = JsonRpcError> = std::result::Result<T, E>;

/// Every way a JSON-RPC call made by this crate can fail.
///
/// The first four variants are the failure kinds of the protocol itself: the transport produced
/// nothing usable, the body wasn't JSON, the JSON wasn't a JSON-RPC response, or the server
/// reported an error.  The rest are local misuse or (de)serialization of caller-provided types.
#[derive(Debug, Error)]
pub enum JsonRpcError {
    #[error("Invalid or empty response from server: {reason}")]
    InvalidResponse { reason: String },

    #[error("Couldn't parse JSON string received from server:\n{json}")]
    InvalidJson {
        source: serde_json::Error,
        json: String,
    },

    #[error("Server error {code}: {message}")]
    ServerError {
        code: i128,
        message: String,
        data: Option<JsonValue>,
    },

    #[error("Transport error")]
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Error serializing request to JSON")]
    SerRequest { source: serde_json::Error },

    #[error("Error deserializing the result of '{method}' into {type_name}")]
    DeserResult {
        source: serde_json::Error,
        method: String,
        type_name: &'static str,
    },

    #[error("JSON-RPC method name must not be empty")]
    EmptyMethod,

    #[error("Invalid server URL '{url}'")]
    InvalidUrl { source: url::ParseError, url: String },

    #[error("No transport was provided and the `http` feature is disabled")]
    NoTransport,

    #[error("Batch has already been sent; no further calls can be recorded")]
    BatchClosed,

    #[error("No response was received for request {id}")]
    Unanswered { id: Id },
}

/// Flat discriminant of [`JsonRpcError`], convenient for structured logging and coarse matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidResponse,
    InvalidJson,
    ServerError,
    Transport,
    Serialization,
    Usage,
    Unanswered,
}

impl JsonRpcError {
    pub(crate) fn invalid_response(reason: impl Into<String>) -> Self {
        JsonRpcError::InvalidResponse { reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JsonRpcError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            JsonRpcError::InvalidJson { .. } => ErrorKind::InvalidJson,
            JsonRpcError::ServerError { .. } => ErrorKind::ServerError,
            JsonRpcError::Transport { .. } => ErrorKind::Transport,
            JsonRpcError::SerRequest { .. } | JsonRpcError::DeserResult { .. } => ErrorKind::Serialization,
            JsonRpcError::EmptyMethod
            | JsonRpcError::InvalidUrl { .. }
            | JsonRpcError::NoTransport
            | JsonRpcError::BatchClosed => ErrorKind::Usage,
            JsonRpcError::Unanswered { .. } => ErrorKind::Unanswered,
        }
    }

    /// The numeric error code, if this is an error reported by the server.
    pub fn server_error_code(&self) -> Option<i128> {
        match self {
            JsonRpcError::ServerError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ErrorObject> for JsonRpcError {
    fn from(error: ErrorObject) -> Self {
        JsonRpcError::ServerError {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}
