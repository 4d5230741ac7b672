//! Rust struct definitions that ser/de to/from JSON-RPC messages.
//!
//! Requests are built and serialized by this crate, so they are strongly typed end to end.
//! Responses arrive from a server we don't control, so they are first decoded into a plain
//! [`JsonValue`], checked by [`crate::validate`], and only then converted into a [`Response`].
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{JsonRpcError, Result, validate};
/// Re-export the basic protocol types from `jsonrpsee-types`.
///
/// No need to re-invent this wheel.
pub use jsonrpsee_types::{error::ErrorCode, params::TwoPointZero};
pub use serde_json::{Map as JsonMap, Value as JsonValue};

/// Request Id
#[derive(Debug, PartialEq, Clone, Hash, Eq, Deserialize, Serialize, PartialOrd, Ord)]
#[serde(untagged)]
pub enum Id {
    /// Null
    Null,
    /// Numeric id
    Number(u64),
    /// String id
    Str(String),
}

impl Id {
    /// Test whether this id is the same as the `id` value of a decoded response.
    ///
    /// This is JSON value equality, so `Id::Number(1)` does not match `"1"`.
    pub fn matches(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (Id::Null, JsonValue::Null) => true,
            (Id::Number(n), JsonValue::Number(v)) => v.as_u64() == Some(*n),
            (Id::Str(s), JsonValue::String(v)) => s == v,
            _ => false,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => f.write_str("null"),
            Id::Number(n) => write!(f, "{n}"),
            Id::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id::Number(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

/// Parameters of a request, either by-position or by-name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Array(Vec<JsonValue>),
    Object(JsonMap<String, JsonValue>),
}

impl Params {
    /// Turn the arguments of a call into request params.
    ///
    /// No arguments means no params at all.  With `named_params`, a call whose only argument is a
    /// JSON object sends that object as by-name params; every other call sends its arguments
    /// by-position.
    pub fn from_args(args: Vec<JsonValue>, named_params: bool) -> Option<Self> {
        if args.is_empty() {
            return None;
        }

        if named_params && args.len() == 1 {
            let mut args = args;
            return match args.pop() {
                Some(JsonValue::Object(map)) => Some(Params::Object(map)),
                Some(arg) => Some(Params::Array(vec![arg])),
                None => None,
            };
        }

        Some(Params::Array(args))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Array(values) => values.is_empty(),
            Params::Object(map) => map.is_empty(),
        }
    }
}

impl From<Vec<JsonValue>> for Params {
    fn from(values: Vec<JsonValue>) -> Self {
        Params::Array(values)
    }
}

impl From<JsonMap<String, JsonValue>> for Params {
    fn from(map: JsonMap<String, JsonValue>) -> Self {
        Params::Object(map)
    }
}

fn params_absent(params: &Option<Params>) -> bool {
    params.as_ref().is_none_or(Params::is_empty)
}

/// Serializable [JSON-RPC request object](https://www.jsonrpc.org/specification#request-object).
///
/// A request without an id is a notification.  Requests are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    jsonrpc: TwoPointZero,
    method: String,
    #[serde(default, skip_serializing_if = "params_absent")]
    params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Id>,
}

impl Request {
    /// Create a serializable JSON-RPC method call.
    ///
    /// Empty params are normalized to no params, since they are never put on the wire.
    pub fn new(
        id: impl Into<Option<Id>>,
        method: impl Into<String>,
        params: impl Into<Option<Params>>,
    ) -> Result<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(JsonRpcError::EmptyMethod);
        }

        Ok(Self {
            jsonrpc: TwoPointZero,
            method,
            params: params.into().filter(|params| !params.is_empty()),
            id: id.into(),
        })
    }

    /// Create a serializable JSON-RPC notification, which is a request without an id.
    pub fn notification(method: impl Into<String>, params: impl Into<Option<Params>>) -> Result<Self> {
        Self::new(None, method, params)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| JsonRpcError::SerRequest { source })
    }
}

/// [JSON-RPC error object](https://www.jsonrpc.org/specification#error_object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Any JSON integer, including codes outside the range of `i64`.
    pub code: i128,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl ErrorObject {
    pub fn new(code: i128, message: impl Into<String>, data: impl Into<Option<JsonValue>>) -> Self {
        Self {
            code,
            message: message.into(),
            data: data.into(),
        }
    }

    /// Classify the code as one of the codes reserved by JSON-RPC 2.0, if it fits.
    pub fn error_code(&self) -> Option<ErrorCode> {
        i32::try_from(self.code).ok().map(ErrorCode::from)
    }
}

/// Possible payloads of a JSON RPC response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResponsePayload {
    #[serde(rename = "result")]
    Success(JsonValue),
    #[serde(rename = "error")]
    Error(ErrorObject),
}

impl ResponsePayload {
    /// Convert into the result value, or the server error if this is an error payload.
    pub fn into_result(self) -> Result<JsonValue> {
        match self {
            ResponsePayload::Success(result) => Ok(result),
            ResponsePayload::Error(error) => Err(error.into()),
        }
    }
}

/// JSON-RPC response object as defined in the [spec](https://www.jsonrpc.org/specification#response_object).
///
/// The `id` is kept as the raw JSON value the server sent, since the protocol doesn't constrain it
/// and correlation compares it against our own [`Id`] with [`Id::matches`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: TwoPointZero,
    #[serde(flatten)]
    pub payload: ResponsePayload,
    pub id: JsonValue,
}

impl Response {
    pub fn success(id: impl Into<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: TwoPointZero,
            payload: ResponsePayload::Success(result),
            id: id.into(),
        }
    }

    pub fn error(id: impl Into<JsonValue>, error: ErrorObject) -> Self {
        Self {
            jsonrpc: TwoPointZero,
            payload: ResponsePayload::Error(error),
            id: id.into(),
        }
    }

    /// Convert a decoded payload into a response, failing with
    /// [`JsonRpcError::InvalidResponse`] if it doesn't have the shape of a JSON-RPC response.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        if let Err(invalid) = validate::check_response(&value) {
            tracing::debug!(%invalid, payload = %value, "Rejecting invalid JSON-RPC response");
            return Err(JsonRpcError::invalid_response(invalid.to_string()));
        }

        let JsonValue::Object(mut map) = value else {
            return Err(JsonRpcError::invalid_response("response is not an object"));
        };

        let id = map.remove("id").unwrap_or(JsonValue::Null);
        let payload = match map.remove("error") {
            Some(error) => ResponsePayload::Error(
                serde_json::from_value(error)
                    .map_err(|e| JsonRpcError::invalid_response(format!("malformed error object: {e}")))?,
            ),
            None => ResponsePayload::Success(map.remove("result").unwrap_or(JsonValue::Null)),
        };

        Ok(Self {
            jsonrpc: TwoPointZero,
            payload,
            id,
        })
    }
}
