//! Shape checks for decoded JSON-RPC response payloads.
//!
//! These operate on a raw [`JsonValue`] rather than a typed struct because the point is to decide
//! whether whatever the server sent back can be trusted as a JSON-RPC response at all.
use serde_json::Value as JsonValue;

use crate::JSON_RPC_VERSION;

/// The first rule a response payload was found to violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Invalid {
    #[strum(to_string = "response is not an object")]
    NotAnObject,
    #[strum(to_string = "missing or wrong \"jsonrpc\" version tag")]
    WrongVersion,
    #[strum(to_string = "missing \"id\"")]
    MissingId,
    #[strum(to_string = "has both \"result\" and \"error\"")]
    BothResultAndError,
    #[strum(to_string = "has neither \"result\" nor \"error\"")]
    NeitherResultNorError,
    #[strum(to_string = "\"error\" is not an object")]
    ErrorNotAnObject,
    #[strum(to_string = "\"error.code\" is missing or not an integer")]
    BadErrorCode,
    #[strum(to_string = "\"error.message\" is missing or not a string")]
    BadErrorMessage,
}

/// Check a decoded payload against the shape of a JSON-RPC 2.0 response object.
pub fn check_response(data: &JsonValue) -> Result<(), Invalid> {
    let Some(object) = data.as_object() else {
        return Err(Invalid::NotAnObject);
    };

    if object.get("jsonrpc").and_then(JsonValue::as_str) != Some(JSON_RPC_VERSION) {
        return Err(Invalid::WrongVersion);
    }

    if !object.contains_key("id") {
        return Err(Invalid::MissingId);
    }

    match (object.get("result"), object.get("error")) {
        (Some(_), Some(_)) => Err(Invalid::BothResultAndError),
        (None, None) => Err(Invalid::NeitherResultNorError),
        (Some(_), None) => Ok(()),
        (None, Some(error)) => {
            let error = error.as_object().ok_or(Invalid::ErrorNotAnObject)?;
            if !error.get("code").is_some_and(|code| code.is_i64() || code.is_u64()) {
                return Err(Invalid::BadErrorCode);
            }
            if !error.get("message").is_some_and(JsonValue::is_string) {
                return Err(Invalid::BadErrorMessage);
            }
            Ok(())
        }
    }
}

/// Pass/fail version of [`check_response`].
pub fn is_valid_response(data: &JsonValue) -> bool {
    check_response(data).is_ok()
}
