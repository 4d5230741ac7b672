//! In this crate, the concept of a "transport" abstracts away the details of how a serialized
//! JSON-RPC payload gets to the server and how the server's reply gets back.
//!
//! At the JSON RPC level a transport is very simply something that can POST a string to a URL and
//! hand back whatever body came back.  Connection pooling, TLS, socket-level retries and so on are
//! entirely the transport's business.  The only transport shipped with this crate is
//! [`HttpTransport`], enabled by the `http` feature.
use futures::future::BoxFuture;
use futures::{FutureExt, TryFutureExt};
use url::Url;

use crate::config::TransportOptions;
use crate::{JsonRpcError, Result};

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// What came back from the server in reply to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// Transport-specific status, such as the HTTP status code.  Informational only.
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl TransportResponse {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            status: None,
            body: Some(body.into()),
        }
    }

    /// The body, if there is one and it isn't empty.
    pub fn usable_body(&self) -> Option<&str> {
        self.body.as_deref().filter(|body| !body.is_empty())
    }
}

/// A transport posts a serialized JSON-RPC payload (a single request or a batch) and returns the
/// reply.
///
/// From the transport's perspective the body is opaque text.  Returning `Ok(None)` means the
/// transport completed but got no response object at all; the client treats that, a missing body
/// and an empty body all the same way.
///
/// There is exactly one `post` per client call; implementations should not retry on their own
/// unless that's a documented property of the transport.
pub trait Transport: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// POST `body` to `url`.
    ///
    /// `options` carries the content type and any headers or timeout that apply to this request.
    /// A timeout, if present, is for the transport to enforce; the client doesn't implement one.
    fn post(
        &self,
        url: &Url,
        body: String,
        options: &TransportOptions,
    ) -> impl Future<Output = Result<Option<TransportResponse>, Self::Error>> + Send;
}

/// Internal dyn-compatible wrapper trait around [`Transport`] to erase the types and allow dynamic
/// dispatch
pub(crate) trait BoxedTransport: Send + Sync + 'static {
    fn boxed_post<'a>(
        &'a self,
        url: &'a Url,
        body: String,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<Option<TransportResponse>>>;
}

impl<T> BoxedTransport for T
where
    T: Transport,
{
    fn boxed_post<'a>(
        &'a self,
        url: &'a Url,
        body: String,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<Option<TransportResponse>>> {
        <Self as Transport>::post(self, url, body, options)
            .map_err(|e| JsonRpcError::Transport { source: Box::new(e) })
            .boxed()
    }
}
