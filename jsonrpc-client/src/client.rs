use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::instrument;
use url::Url;

use crate::batch::Batch;
use crate::config::{CallOptions, ClientConfig};
use crate::id::{IdGenerator, RandomIdGenerator};
use crate::transport::{BoxedTransport, Transport};
use crate::types::{Id, Params, Request, Response, ResponsePayload};
use crate::{JsonRpcError, Result};

/// Builder for a [`Client`].
///
/// Only the URL is required.  Without [`Self::with_transport`] the client lazily creates an
/// [`crate::HttpTransport`] the first time it sends something.
pub struct ClientBuilder {
    url: String,
    config: ClientConfig,
    transport: Option<Box<dyn BoxedTransport>>,
    id_generator: Box<dyn IdGenerator>,
}

impl ClientBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: ClientConfig::default(),
            transport: None,
            id_generator: Box::new(RandomIdGenerator),
        }
    }

    /// Replace the whole configuration, for instance with one loaded from a config file.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.config.content_type = content_type.into();
        self
    }

    pub fn with_named_params(mut self, named_params: bool) -> Self {
        self.config.named_params = named_params;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Transport-specific option sent with every request.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.config.extra.insert(name.into(), value.into());
        self
    }

    /// Use this transport instead of the default HTTP one.
    pub fn with_transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn with_id_generator(mut self, id_generator: impl IdGenerator) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    pub fn build(self) -> Result<Client> {
        let url = Url::parse(&self.url).map_err(|source| JsonRpcError::InvalidUrl {
            source,
            url: self.url.clone(),
        })?;

        #[cfg(not(feature = "http"))]
        if self.transport.is_none() {
            return Err(JsonRpcError::NoTransport);
        }

        let transport = self.transport.map(OnceLock::from).unwrap_or_default();

        Ok(Client {
            inner: Arc::new(ClientInner {
                url,
                config: self.config,
                transport,
                id_generator: self.id_generator,
            }),
        })
    }
}

/// A JSON-RPC client bound to one server URL.
///
/// Cheap to clone; clones share the transport and the id generator.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    url: Url,
    config: ClientConfig,
    transport: OnceLock<Box<dyn BoxedTransport>>,
    id_generator: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// A client with the default configuration and the default HTTP transport.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::builder(url).build()
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Invoke a method with positional arguments and return its result verbatim.
    ///
    /// If the client was built with named params and `args` is a single JSON object, that object
    /// is sent as by-name params.
    pub async fn invoke(&self, method: &str, args: Vec<JsonValue>) -> Result<JsonValue> {
        self.invoke_raw(method, args, None).await
    }

    /// Like [`Self::invoke`], with extra transport options for this call only.
    pub async fn invoke_with(&self, method: &str, args: Vec<JsonValue>, options: &CallOptions) -> Result<JsonValue> {
        self.invoke_raw(method, args, Some(options)).await
    }

    /// Invoke a method with serializable params, deserializing the result.
    ///
    /// A `params` value that serializes to a JSON array supplies the positional arguments; `()`
    /// (null) means no arguments; anything else is passed as the only argument.
    pub async fn call_method<Req, Resp>(&self, method: &str, params: Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let args = match serde_json::to_value(params).map_err(|source| JsonRpcError::SerRequest { source })? {
            JsonValue::Array(args) => args,
            JsonValue::Null => Vec::new(),
            arg => vec![arg],
        };

        let result = self.invoke_raw(method, args, None).await?;

        serde_json::from_value(result).map_err(|source| JsonRpcError::DeserResult {
            source,
            method: method.to_string(),
            type_name: std::any::type_name::<Resp>(),
        })
    }

    /// Send a notification: a request without an id.
    ///
    /// Completes as soon as the transport has posted it.  Whatever the server sends back, if
    /// anything, is ignored.
    #[instrument(skip_all, fields(method = %method))]
    pub async fn notify(&self, method: &str, args: Vec<JsonValue>) -> Result<()> {
        let request = Request::notification(method, self.params_from_args(args))?;
        let body = request.to_json()?;
        tracing::trace!(%body, "Sending notification");

        self.post(body, None).await?;
        Ok(())
    }

    /// Record a batch of calls in `setup`, send them in one request, and return the sent batch.
    ///
    /// The [`crate::BatchResponse`] placeholders handed out during `setup` are populated by the
    /// time this returns successfully.  The returned batch refuses any further calls.
    pub async fn batch<F>(&self, setup: F) -> Result<Batch>
    where
        F: FnOnce(&mut Batch) -> Result<()>,
    {
        let mut batch = self.start_batch();
        setup(&mut batch)?;
        batch.send().await?;
        Ok(batch)
    }

    /// Start recording a batch, to be sent explicitly with [`Batch::send`].
    pub fn start_batch(&self) -> Batch {
        Batch::new(self.clone())
    }

    #[instrument(skip_all, fields(method = %method, url = %self.inner.url))]
    async fn invoke_raw(&self, method: &str, args: Vec<JsonValue>, options: Option<&CallOptions>) -> Result<JsonValue> {
        let request_id = self.next_id();
        let request = Request::new(request_id.clone(), method, self.params_from_args(args))?;
        let body = request.to_json()?;
        tracing::debug!(%request_id, "Sending request");
        tracing::trace!(%body, "Request body");

        let result = self.exchange(body, options).await.and_then(|data| {
            let response = Response::from_value(data)?;
            if !request_id.matches(&response.id) {
                tracing::warn!(%request_id, response_id = %response.id,
                    "Response id does not match request id");
            }
            match response.payload {
                ResponsePayload::Success(result) => Ok(result),
                ResponsePayload::Error(error) => Err(error.into()),
            }
        });

        if let Err(e) = &result {
            tracing::debug!(%request_id, kind = %e.kind(), err = %e, "Request failed");
        }

        result
    }

    /// Post a payload and decode the reply.
    pub(crate) async fn exchange(&self, body: String, options: Option<&CallOptions>) -> Result<JsonValue> {
        let Some(body) = self.post(body, options).await? else {
            return Err(JsonRpcError::invalid_response("no response body"));
        };
        tracing::trace!(%body, "Response body");

        serde_json::from_str(&body).map_err(|source| JsonRpcError::InvalidJson { source, json: body })
    }

    /// Post a payload, returning the reply body if there is a non-empty one.
    pub(crate) async fn post(&self, body: String, options: Option<&CallOptions>) -> Result<Option<String>> {
        let options = self.inner.config.transport_options(options);
        let response = self
            .transport()?
            .boxed_post(&self.inner.url, body, &options)
            .await?;

        if let Some(status) = response.as_ref().and_then(|response| response.status) {
            tracing::debug!(status, "Transport returned response");
        }

        Ok(response.and_then(|response| response.usable_body().map(str::to_string)))
    }

    pub(crate) fn next_id(&self) -> Id {
        self.inner.id_generator.next_id()
    }

    pub(crate) fn params_from_args(&self, args: Vec<JsonValue>) -> Option<Params> {
        Params::from_args(args, self.inner.config.named_params)
    }

    fn transport(&self) -> Result<&dyn BoxedTransport> {
        #[cfg(feature = "http")]
        let transport = Some(
            self.inner
                .transport
                .get_or_init(|| Box::new(crate::transport::HttpTransport::new())),
        );

        #[cfg(not(feature = "http"))]
        let transport = self.inner.transport.get();

        transport.map(|transport| transport.as_ref()).ok_or(JsonRpcError::NoTransport)
    }
}
