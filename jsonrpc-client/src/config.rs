//! Client configuration, and the per-request options derived from it.
use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Configuration of a [`crate::Client`].
///
/// Everything here can be deserialized from a config file.  The transport and the id generator
/// are not configuration but collaborators, and are provided on [`crate::ClientBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Content type of every request this client sends.
    pub content_type: String,

    /// Send the lone object argument of a call as by-name params instead of a one-element array.
    pub named_params: bool,

    /// Headers added to every request.
    pub headers: BTreeMap<String, String>,

    /// Request timeout, enforced by the transport.
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Transport-specific options, passed through untouched.  What they mean is up to the
    /// transport; [`crate::HttpTransport`] has none.
    pub extra: JsonMap<String, JsonValue>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            named_params: false,
            headers: BTreeMap::new(),
            timeout: None,
            extra: JsonMap::new(),
        }
    }
}

impl ClientConfig {
    /// Options for one request: the client defaults overlaid with the call's own options.
    ///
    /// Per-call headers and extra options replace client ones of the same name, and a per-call
    /// timeout replaces the client timeout.  The content type is always the client's.
    pub fn transport_options(&self, call: Option<&CallOptions>) -> TransportOptions {
        let mut options = TransportOptions {
            content_type: self.content_type.clone(),
            headers: self.headers.clone(),
            timeout: self.timeout,
            extra: self.extra.clone(),
        };

        if let Some(call) = call {
            options
                .headers
                .extend(call.headers.iter().map(|(name, value)| (name.clone(), value.clone())));
            options
                .extra
                .extend(call.extra.iter().map(|(name, value)| (name.clone(), value.clone())));
            if call.timeout.is_some() {
                options.timeout = call.timeout;
            }
        }

        options
    }
}

/// Transport options for a single call, passed to [`crate::Client::invoke_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    pub extra: JsonMap<String, JsonValue>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a transport-specific option for this call.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Everything a [`crate::Transport`] needs to know about how to post a request, besides the URL
/// and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub content_type: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    /// Options only the transport understands.
    pub extra: JsonMap<String, JsonValue>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        ClientConfig::default().transport_options(None)
    }
}
