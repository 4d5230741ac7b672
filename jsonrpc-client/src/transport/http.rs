//! HTTP transport on top of `reqwest`.
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::{Transport, TransportResponse};
use crate::config::TransportOptions;

/// Posts JSON-RPC payloads over HTTP(S).
///
/// Any HTTP status is passed back to the client along with the body, since JSON-RPC servers
/// commonly report errors with a non-2xx status and a perfectly good error object in the body.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pre-configured `reqwest` client, for instance one with custom TLS roots or a proxy.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    type Error = reqwest::Error;

    fn post(
        &self,
        url: &Url,
        body: String,
        options: &TransportOptions,
    ) -> impl Future<Output = Result<Option<TransportResponse>, Self::Error>> + Send {
        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, options.content_type.as_str())
            .body(body);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        async move {
            let response = request.send().await?;
            let status = response.status();
            tracing::trace!(%status, "Received HTTP response");

            let body = response.text().await?;
            Ok(Some(TransportResponse {
                status: Some(status.as_u16()),
                body: Some(body),
            }))
        }
    }
}
