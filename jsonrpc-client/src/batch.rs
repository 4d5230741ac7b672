//! Batches of JSON-RPC calls, sent together as one JSON array.
//!
//! Recording a call in a [`Batch`] sends nothing; it hands back a [`BatchResponse`] placeholder
//! which stays empty until [`Batch::send`] posts the whole batch and matches each element of the
//! server's reply to its request by id.  The caller owns the placeholders.  The batch keeps only
//! weak references to them, so dropping a placeholder you don't care about is fine.
use std::sync::{Arc, OnceLock, Weak};

use itertools::Itertools;
use serde_json::Value as JsonValue;
use tracing::instrument;

use crate::client::Client;
use crate::types::{ErrorObject, Id, Request, Response, ResponsePayload};
use crate::{JsonRpcError, Result};

/// Placeholder for the response to one call recorded in a [`Batch`].
///
/// Populated at most once, when the batch is sent and the server's reply contains an element with
/// this call's id.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    slot: Arc<ResponseSlot>,
}

#[derive(Debug)]
struct ResponseSlot {
    id: Id,
    method: String,
    payload: OnceLock<ResponsePayload>,
}

impl BatchResponse {
    fn new(id: Id, method: &str) -> Self {
        Self {
            slot: Arc::new(ResponseSlot {
                id,
                method: method.to_string(),
                payload: OnceLock::new(),
            }),
        }
    }

    pub fn id(&self) -> &Id {
        &self.slot.id
    }

    pub fn method(&self) -> &str {
        &self.slot.method
    }

    pub fn is_populated(&self) -> bool {
        self.slot.payload.get().is_some()
    }

    /// Populated with a result.
    pub fn succeeded(&self) -> bool {
        matches!(self.slot.payload.get(), Some(ResponsePayload::Success(_)))
    }

    /// Populated with an error.
    pub fn is_error(&self) -> bool {
        matches!(self.slot.payload.get(), Some(ResponsePayload::Error(_)))
    }

    pub fn result(&self) -> Option<&JsonValue> {
        match self.slot.payload.get() {
            Some(ResponsePayload::Success(result)) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorObject> {
        match self.slot.payload.get() {
            Some(ResponsePayload::Error(error)) => Some(error),
            _ => None,
        }
    }

    /// The result, the server's error, or [`JsonRpcError::Unanswered`] if nothing was received
    /// for this call.
    pub fn outcome(&self) -> Result<JsonValue> {
        match self.slot.payload.get() {
            Some(payload) => payload.clone().into_result(),
            None => Err(JsonRpcError::Unanswered {
                id: self.slot.id.clone(),
            }),
        }
    }

    fn downgrade(&self) -> Weak<ResponseSlot> {
        Arc::downgrade(&self.slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Recording,
    Sent,
}

/// A request waiting in the batch, with the placeholder to populate if it expects a reply.
struct QueuedRequest {
    request: Request,
    placeholder: Option<Weak<ResponseSlot>>,
}

/// A batch of calls being recorded, or already sent.
///
/// Once [`Self::send`] has been called, whether it succeeded or not, the batch is closed and
/// every further [`Self::call`], [`Self::notify`] or [`Self::send`] fails with
/// [`JsonRpcError::BatchClosed`].
pub struct Batch {
    client: Client,
    state: BatchState,
    queue: Vec<QueuedRequest>,
}

impl Batch {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            state: BatchState::Recording,
            queue: Vec::new(),
        }
    }

    /// Record a call to `method`, returning the placeholder its response will be put in.
    ///
    /// Arguments are turned into params the same way as for [`Client::invoke`].
    pub fn call(&mut self, method: &str, args: Vec<JsonValue>) -> Result<BatchResponse> {
        self.ensure_recording()?;

        let id = self.client.next_id();
        let request = Request::new(id.clone(), method, self.client.params_from_args(args))?;
        let placeholder = BatchResponse::new(id, method);
        tracing::trace!(request_id = %placeholder.id(), method, "Recorded batch call");

        self.queue.push(QueuedRequest {
            request,
            placeholder: Some(placeholder.downgrade()),
        });

        Ok(placeholder)
    }

    /// Record a notification.  The server won't reply to it, so there is no placeholder.
    pub fn notify(&mut self, method: &str, args: Vec<JsonValue>) -> Result<()> {
        self.ensure_recording()?;

        let request = Request::notification(method, self.client.params_from_args(args))?;
        tracing::trace!(method, "Recorded batch notification");

        self.queue.push(QueuedRequest {
            request,
            placeholder: None,
        });

        Ok(())
    }

    /// Number of requests recorded and not yet sent.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_sent(&self) -> bool {
        self.state == BatchState::Sent
    }

    /// Send every recorded request as one JSON array and populate the placeholders from the reply.
    ///
    /// Replies are matched to requests by id, in whatever order the server sent them.  Each
    /// reply element is matched to the earliest recorded request with an equal id; if several
    /// requests share an id, only the first of them can be answered.
    ///
    /// The send fails with [`JsonRpcError::InvalidResponse`] if the reply isn't an array, if any
    /// element isn't a valid response or doesn't match a request, or if some request got no
    /// reply.  Placeholders populated before the failure was noticed remain populated.
    ///
    /// An empty batch is not sent at all.
    #[instrument(skip_all, fields(url = %self.client.url(), batch_size = self.queue.len()))]
    pub async fn send(&mut self) -> Result<()> {
        self.ensure_recording()?;
        self.state = BatchState::Sent;

        let queue = std::mem::take(&mut self.queue);
        if queue.is_empty() {
            tracing::debug!("Batch is empty; nothing to send");
            return Ok(());
        }

        let requests: Vec<&Request> = queue.iter().map(|queued| &queued.request).collect();
        let body = serde_json::to_string(&requests).map_err(|source| JsonRpcError::SerRequest { source })?;
        tracing::debug!(
            methods = %queue.iter().map(|queued| queued.request.method()).join(", "),
            "Sending batch"
        );
        tracing::trace!(%body, "Batch request body");

        if queue.iter().all(|queued| queued.request.is_notification()) {
            // Nobody is waiting for a reply, so whatever the server sends back is irrelevant
            self.client.post(body, None).await?;
            return Ok(());
        }

        let result = match self.client.exchange(body, None).await? {
            JsonValue::Array(elements) => Self::correlate(&queue, elements),
            other => {
                tracing::debug!(payload = %other, "Batch response is not an array");
                Err(JsonRpcError::invalid_response("batch response is not an array"))
            }
        };

        if let Err(e) = &result {
            tracing::debug!(kind = %e.kind(), err = %e, "Batch failed");
        }

        result
    }

    /// Populate the placeholders in `queue` from the elements of the server's reply.
    fn correlate(queue: &[QueuedRequest], elements: Vec<JsonValue>) -> Result<()> {
        let mut answered = vec![false; queue.len()];

        for element in elements {
            let response = Response::from_value(element)?;

            let Some(position) = queue.iter().position(|queued| {
                queued
                    .request
                    .id()
                    .is_some_and(|id| id.matches(&response.id))
            }) else {
                return Err(JsonRpcError::invalid_response(format!(
                    "no request in the batch has id {}",
                    response.id
                )));
            };

            if answered[position] {
                tracing::warn!(response_id = %response.id,
                    "Duplicate response in batch; keeping the first one");
                continue;
            }
            answered[position] = true;

            match queue[position].placeholder.as_ref().and_then(Weak::upgrade) {
                Some(slot) => {
                    // `answered` prevents a second reply from reaching the same slot
                    let populated = slot.payload.set(response.payload).is_ok();
                    debug_assert!(populated, "batch placeholder for {} populated twice", slot.id);
                }
                None => {
                    tracing::trace!(response_id = %response.id,
                        "Placeholder was dropped before the response arrived");
                }
            }
        }

        let unanswered = queue
            .iter()
            .zip(&answered)
            .find_map(|(queued, answered)| queued.request.id().filter(|_| !answered));
        if let Some(id) = unanswered {
            return Err(JsonRpcError::invalid_response(format!(
                "no response for request {id} in the batch"
            )));
        }

        Ok(())
    }

    fn ensure_recording(&self) -> Result<()> {
        match self.state {
            BatchState::Recording => Ok(()),
            BatchState::Sent => Err(JsonRpcError::BatchClosed),
        }
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .finish()
    }
}
