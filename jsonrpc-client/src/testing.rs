//! Helpers for testing the JSON RPC client.
//!
//! This module is only compiled when `test` is enabled
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use jsonrpc_client::{Id, IdGenerator, JsonValue, Transport, TransportOptions, TransportResponse};
use url::Url;

/// URL that test clients are bound to.  Nothing listens there; tests use [`MockTransport`].
pub const TEST_URL: &str = "http://localhost:8080/rpc";

/// Initialize tracing with a subscriber and some reasonable defaults suitable for enabling log
/// output in tests.
///
/// This is idempotent; it can be called from multiple tests in multiple threads but will only
/// initialize tracing once.
pub fn init_test_logging() {
    use std::sync::OnceLock;

    const DEFAULT_LOG_FILTER: &str = "trace";
    static INIT_LOGGING: OnceLock<()> = OnceLock::new();

    INIT_LOGGING.get_or_init(|| {
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
            .with_test_writer()
            .try_init()
            .unwrap()
    });
}

/// One post made through a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub url: String,
    pub body: String,
    pub options: TransportOptions,
}

impl RecordedPost {
    pub fn body_json(&self) -> JsonValue {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Debug)]
enum ScriptedReply {
    Respond(Option<TransportResponse>),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<ScriptedReply>,
    posts: Vec<RecordedPost>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockTransportError(String);

/// Transport that records every post and answers with scripted replies, in order.
///
/// Clones share state, so a test can keep one clone to inspect what the client sent.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to the next post with this body.
    pub fn reply_with(&self, body: impl Into<String>) -> &Self {
        self.push(ScriptedReply::Respond(Some(TransportResponse::with_body(body))))
    }

    pub fn reply_json(&self, body: JsonValue) -> &Self {
        self.reply_with(body.to_string())
    }

    /// Reply to the next post with no response object at all.
    pub fn reply_nothing(&self) -> &Self {
        self.push(ScriptedReply::Respond(None))
    }

    /// Reply to the next post with a response that has no body.
    pub fn reply_without_body(&self) -> &Self {
        self.push(ScriptedReply::Respond(Some(TransportResponse {
            status: Some(204),
            body: None,
        })))
    }

    /// Fail the next post with a transport error.
    pub fn fail_with(&self, message: impl Into<String>) -> &Self {
        self.push(ScriptedReply::Fail(message.into()))
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn last_post(&self) -> RecordedPost {
        self.posts().pop().expect("no posts were made")
    }

    fn push(&self, reply: ScriptedReply) -> &Self {
        self.state.lock().unwrap().replies.push_back(reply);
        self
    }
}

impl Transport for MockTransport {
    type Error = MockTransportError;

    fn post(
        &self,
        url: &Url,
        body: String,
        options: &TransportOptions,
    ) -> impl Future<Output = Result<Option<TransportResponse>, Self::Error>> + Send {
        let mut state = self.state.lock().unwrap();
        state.posts.push(RecordedPost {
            url: url.to_string(),
            body,
            options: options.clone(),
        });

        let reply = match state.replies.pop_front() {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::Fail(message)) => Err(MockTransportError(message)),
            None => Err(MockTransportError("no scripted reply left".to_string())),
        };

        std::future::ready(reply)
    }
}

/// Id generator that hands out a fixed sequence of ids, repeating the last one once exhausted.
#[derive(Debug)]
pub struct ScriptedIds {
    ids: Mutex<VecDeque<Id>>,
}

impl ScriptedIds {
    pub fn new<I>(ids: impl IntoIterator<Item = I>) -> Self
    where
        I: Into<Id>,
    {
        let ids: VecDeque<Id> = ids.into_iter().map(Into::into).collect();
        assert!(!ids.is_empty(), "ScriptedIds needs at least one id");
        Self { ids: Mutex::new(ids) }
    }
}

impl IdGenerator for ScriptedIds {
    fn next_id(&self) -> Id {
        let mut ids = self.ids.lock().unwrap();
        if ids.len() > 1 {
            ids.pop_front().unwrap()
        } else {
            ids[0].clone()
        }
    }
}
